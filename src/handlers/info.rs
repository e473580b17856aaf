//! Informational replies: time, joke, name, weather, news and help

use super::{CommandError, HandlerResult};
use crate::capabilities::NetworkFetch;
use crate::effects::{Outcome, SideEffect};
use chrono::{DateTime, Local};
use serde::Deserialize;
use tracing::debug;

pub const HELP: &str = "Try 'play playlist [name]', 'increase volume', 'add app [name] [url]', etc.";

#[derive(Debug, Deserialize)]
struct WeatherReport {
    weather: Vec<WeatherCondition>,
    main: WeatherMain,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct NewsReport {
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: String,
    source: ArticleSource,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: String,
}

pub fn time(now: DateTime<Local>) -> Outcome {
    Outcome::say(format!("The current time is {}.", now.format("%-I:%M:%S %p")))
}

pub fn joke() -> Outcome {
    Outcome::say("Why don't skeletons fight each other? Because they don't have the guts!")
}

pub fn name() -> Outcome {
    Outcome::say("I'm your AI assistant, call me Grok!")
}

pub fn help() -> Outcome {
    Outcome::say(HELP)
}

pub fn weather(network: &dyn NetworkFetch, api_key: Option<&str>, city: &str) -> HandlerResult {
    if city.is_empty() {
        return Err(CommandError::missing("Please specify a city."));
    }
    let api_key = api_key.ok_or_else(|| {
        CommandError::Unconfigured(
            "Please set a valid OpenWeatherMap API key in the configuration.".to_string(),
        )
    })?;

    let url = format!(
        "https://api.openweathermap.org/data/2.5/weather?q={}&appid={}&units=metric",
        urlencoding::encode(city),
        api_key
    );
    let failed = |detail: String| {
        CommandError::external(format!("Sorry, I couldn't fetch the weather for {}.", city), detail)
    };

    let body = network
        .get_json(&url)
        .map_err(|e| failed(format!("Weather fetch failed: {}", e)))?;
    let report: WeatherReport = serde_json::from_value(body)
        .map_err(|e| failed(format!("Unexpected weather payload: {}", e)))?;
    let condition = report
        .weather
        .first()
        .ok_or_else(|| failed("Weather payload has no conditions".to_string()))?;

    debug!("Weather for {}: {:?}", city, report);
    Ok(Outcome::say(format!(
        "The weather in {} is {} with a temperature of {}°C.",
        city, condition.description, report.main.temp
    ))
    .with_effect(SideEffect::SetIcon {
        url: format!("https://openweathermap.org/img/wn/{}.png", condition.icon),
    }))
}

pub fn news(network: &dyn NetworkFetch, api_key: Option<&str>) -> HandlerResult {
    let api_key = api_key.ok_or_else(|| {
        CommandError::Unconfigured("Please set a valid NewsAPI key in the configuration.".to_string())
    })?;

    let url = format!(
        "https://newsapi.org/v2/top-headlines?country=us&apiKey={}",
        api_key
    );
    let failed =
        |detail: String| CommandError::external("Sorry, I couldn't fetch the news right now.", detail);

    let body = network
        .get_json(&url)
        .map_err(|e| failed(format!("News fetch failed: {}", e)))?;
    let report: NewsReport = serde_json::from_value(body)
        .map_err(|e| failed(format!("Unexpected news payload: {}", e)))?;
    let article = report
        .articles
        .first()
        .ok_or_else(|| failed("No headlines returned".to_string()))?;

    Ok(Outcome::say(format!(
        "Here's the latest news: {}, by {}.",
        article.title, article.source.name
    )))
}
