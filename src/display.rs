//! Conversion of call outcomes into the single line the user sees. Failures
//! never escape past this layer; each one becomes an inline message.

use crate::{
    Error, Result,
    client::{
        ChatResponse, CropPrice, FertilizerPrice, GovernmentScheme, HealthResponse,
        ImageClassifyResponse, WeatherForecast,
    },
};

pub fn failure_message(err: &Error) -> String {
    format!("Error: {}", err)
}

pub fn chat_reply(result: &Result<ChatResponse>) -> String {
    match result {
        Ok(response) => response.text.clone(),
        Err(e) => failure_message(e),
    }
}

pub fn classification(result: &Result<ImageClassifyResponse>) -> String {
    match result {
        Ok(response) => format!(
            "{} (confidence {})",
            response.label,
            response.confidence_percent()
        ),
        Err(e) => failure_message(e),
    }
}

pub fn health(result: &Result<HealthResponse>) -> String {
    match result {
        Ok(response) if response.is_healthy() => format!("Service is up ({})", response.status),
        Ok(response) => format!("Service reported status: {}", response.status),
        Err(e) => failure_message(e),
    }
}

pub fn weather(forecast: &WeatherForecast) -> String {
    let now = &forecast.current_weather;
    let mut lines = vec![format!(
        "{:.1}°C, {} (humidity {:.0}%, rain chance {:.0}%)",
        now.temperature, now.weather_condition, now.humidity, now.precipitation_probability
    )];
    lines.extend(forecast.farming_advisory.iter().map(|tip| format!("- {}", tip)));
    lines.join("\n")
}

pub fn crop_price(price: &CropPrice) -> String {
    format!(
        "{} ({}) at {}: Rs {:.0}/quintal, range {:.0}-{:.0} ({})",
        price.crop_name,
        price.variety,
        price.market_name,
        price.modal_price,
        price.min_price,
        price.max_price,
        price.price_trend
    )
}

pub fn fertilizer_price(price: &FertilizerPrice) -> String {
    let mut line = format!(
        "{} by {}: Rs {:.2}/kg [{}]",
        price.fertilizer_name, price.brand, price.price_per_kg, price.availability
    );
    if let Some(subsidized) = price.subsidized_price {
        line.push_str(&format!(", subsidised Rs {:.2}/kg", subsidized));
    }
    line
}

pub fn scheme(scheme: &GovernmentScheme) -> String {
    let scope = scheme.state.as_deref().unwrap_or("central");
    match scheme.benefit_amount {
        Some(amount) => format!(
            "{}: {} [{}, {}] up to Rs {:.0}",
            scheme.scheme_id, scheme.scheme_name, scheme.category, scope, amount
        ),
        None => format!(
            "{}: {} [{}, {}]",
            scheme.scheme_id, scheme.scheme_name, scheme.category, scope
        ),
    }
}
