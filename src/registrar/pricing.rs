use std::str::FromStr;

use serde_json::Value;

use super::{Registrar, text, types::TldPricing};
use crate::method::Method;

pub const PRODUCTS_PATH: &str = "/client/products";

/// What a product plan is priced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
enum Behavior {
    Register,
    Renew,
    Transfer,
    Reactivate,
}

/// Periods and price of one behavior, accumulated over a product's plans.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct PlanRange {
    min_period: u32,
    max_period: u32,
    price: f64,
}

impl PlanRange {
    /// Plans are listed by increasing duration: the first one sets the
    /// minimum period, and every later one moves the maximum and the price.
    fn add(&mut self, duration: u32, price: f64) {
        if self.min_period == 0 {
            self.min_period = duration;
        }
        self.max_period = duration;
        self.price = if price > 0.0 { price } else { 0.0 };
    }
}

fn number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn product_pricing(product: &Value, currency: &str) -> TldPricing {
    let mut register = PlanRange::default();
    let mut renew = PlanRange::default();
    let mut transfer = PlanRange::default();

    for plan in product["plans"].as_array().into_iter().flatten() {
        let Ok(behavior) = Behavior::from_str(&text(&plan["behavior"])) else {
            continue;
        };
        let duration = number(&plan["duration"]) as u32;
        let price = number(&plan["currentPrice"]);
        match behavior {
            Behavior::Register => register.add(duration, price),
            Behavior::Renew => renew.add(duration, price),
            Behavior::Transfer => transfer.add(duration, price),
            // Reactivation has no place in the price list.
            Behavior::Reactivate => {}
        }
    }

    TldPricing {
        extension: format!(".{}", text(&product["name"]).trim_start_matches('.')),
        min_years: register.min_period,
        max_years: register.max_period,
        register_price: register.price,
        renew_price: renew.price,
        transfer_price: transfer.price,
        currency: currency.to_owned(),
        epp_required: true,
    }
}

impl Registrar<'_> {
    /// The price list of every TLD the registrar sells.
    pub fn get_tld_pricing(&self) -> anyhow::Result<Vec<TldPricing>> {
        let reply = self.query(PRODUCTS_PATH, Method::Get)?;
        let products = match &reply {
            Value::Array(products) => products,
            Value::Object(_) => match reply["docs"].as_array() {
                Some(products) => products,
                None => bail!("No pricing data returned"),
            },
            _ => bail!("No pricing data returned"),
        };
        if products.is_empty() {
            bail!("No pricing data returned");
        }
        Ok(products
            .iter()
            .map(|product| product_pricing(product, self.currency()))
            .collect())
    }
}
