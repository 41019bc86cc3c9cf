//! In-memory [`Fetch`] implementation for the unit tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use reqwest::Url;
use serde_json::json;

use crate::{
    api::{Fetch, TransportError},
    core::engine::Endpoints,
};

#[derive(Clone, Default)]
pub struct FakeFetcher(Arc<Mutex<State>>);

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<u8>>,
    days: HashMap<String, serde_json::Value>,
    calls: Vec<String>,
}

impl FakeFetcher {
    pub const COLORS_URL: &str = "https://tempo.test/api/jourTempo";

    pub fn colors_url() -> Url {
        Url::parse(Self::COLORS_URL).unwrap()
    }

    pub fn endpoints() -> Endpoints {
        Endpoints {
            base_table: Url::parse("https://tables.test/base.csv").unwrap(),
            hphc_table: Url::parse("https://tables.test/hphc.csv").unwrap(),
            tempo_table: Url::parse("https://tables.test/tempo.csv").unwrap(),
            tempo_colors: Self::colors_url(),
        }
    }

    /// Serve the table at the URL, missing tables fail with a transport error.
    #[must_use]
    pub fn with_table(self, url: &Url, table: &str) -> Self {
        self.set_table(url, table);
        self
    }

    pub fn set_table(&self, url: &Url, table: &str) {
        self.0.lock().unwrap().tables.insert(url.to_string(), table.as_bytes().to_vec());
    }

    pub fn remove_table(&self, url: &Url) {
        self.0.lock().unwrap().tables.remove(url.as_str());
    }

    /// Serve the color code for the ISO date, missing days fail with a transport error.
    #[must_use]
    pub fn with_day(self, date: &str, code: u8) -> Self {
        self.set_day(date, code);
        self
    }

    pub fn set_day(&self, date: &str, code: u8) {
        let url = format!("{}/{date}", Self::COLORS_URL);
        self.0.lock().unwrap().days.insert(url, json!({"dateJour": date, "codeJour": code}));
    }

    pub fn n_calls(&self) -> usize {
        self.0.lock().unwrap().calls.len()
    }

    pub fn n_calls_to(&self, url: &Url) -> usize {
        self.0.lock().unwrap().calls.iter().filter(|call| *call == url.as_str()).count()
    }
}

#[async_trait]
impl Fetch for FakeFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let mut state = self.0.lock().unwrap();
        state.calls.push(url.to_owned());
        state.tables.get(url).cloned().ok_or_else(|| TransportError::new(url, "connection refused"))
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, TransportError> {
        let mut state = self.0.lock().unwrap();
        state.calls.push(url.to_owned());
        state.days.get(url).cloned().ok_or_else(|| TransportError::new(url, "connection refused"))
    }
}
