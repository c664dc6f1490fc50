use super::Cc1;
use super::counting::parse_count;
use crate::error::InstrumentError;
use crate::property::{PropertyAccess, PropertyValue};
use crate::transport::Transport;

/// A view of one CC1 counting input.
pub struct Channel<'a, T: Transport> {
    cc1: &'a mut Cc1<T>,
    counter: &'static str,
}

impl<'a, T: Transport> Channel<'a, T> {
    pub(super) fn new(cc1: &'a mut Cc1<T>, counter: &'static str) -> Self {
        Self { cc1, counter }
    }

    /// Counts in the last dwell period.
    pub fn count(&mut self) -> Result<u64, InstrumentError> {
        let command = format!("COUN:{}?", self.counter);
        let reply = self.cc1.query(&command)?;
        parse_count(&command, &reply)
    }
}

impl<T: Transport> PropertyAccess for Channel<'_, T> {
    fn property_names(&self) -> &'static [&'static str] {
        &["count"]
    }

    fn get(&mut self, name: &str) -> Result<PropertyValue, InstrumentError> {
        match name {
            "count" => self.count().map(PropertyValue::Count),
            _ => Err(InstrumentError::UnknownProperty(name.to_string())),
        }
    }

    fn set(&mut self, name: &str, _raw: &str) -> Result<(), InstrumentError> {
        match name {
            "count" => Err(InstrumentError::ReadOnly(name.to_string())),
            _ => Err(InstrumentError::UnknownProperty(name.to_string())),
        }
    }
}
