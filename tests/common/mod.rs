//! Shared helpers for integration tests.

#![allow(dead_code)]

use mikrotik_exporter::client::{PropertyMap, QueryClient, Reply};
use mikrotik_exporter::error::{ExporterError, Result};
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::Mutex;

/// Canned response for a command, optionally restricted to calls carrying `arg`.
struct Route {
    command: String,
    arg: Option<String>,
    response: std::result::Result<Vec<PropertyMap>, String>,
}

/// In-memory device answering from canned replies.
#[derive(Default)]
pub struct StaticClient {
    routes: Vec<Route>,
    calls: Mutex<Vec<String>>,
}

impl StaticClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, command: &str, rows: Vec<PropertyMap>) -> Self {
        self.routes.push(Route {
            command: command.to_string(),
            arg: None,
            response: Ok(rows),
        });
        self
    }

    pub fn on_arg(mut self, command: &str, arg: &str, rows: Vec<PropertyMap>) -> Self {
        self.routes.push(Route {
            command: command.to_string(),
            arg: Some(arg.to_string()),
            response: Ok(rows),
        });
        self
    }

    pub fn fail(mut self, command: &str, arg: Option<&str>, message: &str) -> Self {
        self.routes.push(Route {
            command: command.to_string(),
            arg: arg.map(str::to_string),
            response: Err(message.to_string()),
        });
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl QueryClient for StaticClient {
    fn run(&self, command: &str, args: &[&str]) -> Result<Reply> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", command, args.join(" ")).trim().to_string());

        let route = self.routes.iter().find(|route| {
            route.command == command
                && route
                    .arg
                    .as_deref()
                    .map_or(true, |arg| args.contains(&arg))
        });

        match route {
            Some(Route {
                response: Ok(rows), ..
            }) => Ok(Reply::new(rows.clone())),
            Some(Route {
                response: Err(message),
                ..
            }) => Err(ExporterError::Device(message.clone())),
            None => Err(ExporterError::Device(format!("no such command ({})", command))),
        }
    }
}

pub fn row(pairs: &[(&str, &str)]) -> PropertyMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn render(registry: &Registry) -> String {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Value of the series `name` carrying every pair in `labels`.
pub fn sample(text: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    let prefix = format!("{}{{", name);
    text.lines()
        .filter(|line| line.starts_with(&prefix))
        .find(|line| {
            labels
                .iter()
                .all(|(k, v)| line.contains(&format!("{}=\"{}\"", k, v)))
        })
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}

/// Number of series of `name` in `text`.
pub fn series_count(text: &str, name: &str) -> usize {
    let prefix = format!("{}{{", name);
    text.lines().filter(|line| line.starts_with(&prefix)).count()
}
