//! Construction-time processor table
//!
//! The intake layer receives this table explicitly. There is no process-wide
//! registry; the set of active routes is whatever the caller built.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::error_event;
use super::errors::{ProcessError, ProcessResult, SetupError};
use super::record::NormalizedRecord;
use super::schema_processor::Processor;
use crate::observability::{Event, Logger};

/// Routes mapped to processors
#[derive(Default, Clone)]
pub struct ProcessorTable {
    routes: BTreeMap<String, Arc<dyn Processor>>,
}

impl ProcessorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table with every built-in processor
    pub fn standard() -> Result<Self, SetupError> {
        let mut table = Self::new();
        table.register(error_event::ROUTE, Arc::new(error_event::processor()?))?;
        Ok(table)
    }

    /// Adds a processor; each route may be registered once.
    pub fn register(&mut self, route: &str, processor: Arc<dyn Processor>) -> Result<(), SetupError> {
        if self.routes.contains_key(route) {
            return Err(SetupError::DuplicateRoute(route.to_string()));
        }
        Logger::event(
            Event::ProcessorRegistered,
            &[("route", route), ("processor", processor.name())],
        );
        self.routes.insert(route.to_string(), processor);
        Ok(())
    }

    pub fn get(&self, route: &str) -> Option<&Arc<dyn Processor>> {
        self.routes.get(route)
    }

    /// Registered routes in sorted order
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Processes a request body for a route.
    pub fn process(
        &self,
        route: &str,
        bytes: &[u8],
        received_at: DateTime<Utc>,
    ) -> ProcessResult<Vec<NormalizedRecord>> {
        let processor = self
            .get(route)
            .ok_or_else(|| ProcessError::UnknownRoute(route.to_string()))?;
        processor.process(bytes, received_at)
    }
}
