use serde::{Deserialize, Serialize};

use super::filter::FilterExpression;

pub const EVENT_NAME_FIELD: &str = "event:name";
pub const FROM_FIELD: &str = "event:props:from";
pub const TO_FIELD: &str = "event:props:to";

/// Which side of a bridge transfer the network filter applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Directionality {
    From,
    To,
    Either,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventFilter {
    pub event_name: String,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub directionality: Option<Directionality>,
}

impl EventFilter {
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            network: None,
            directionality: None,
        }
    }

    pub fn with_network(mut self, network: impl Into<String>, direction: Directionality) -> Self {
        self.network = Some(network.into());
        self.directionality = Some(direction);
        self
    }
}

/// Build the filter list for a query. The event-name term always comes first.
pub fn build_filters(filter: Option<&EventFilter>) -> Vec<FilterExpression> {
    let Some(filter) = filter else {
        return Vec::new();
    };

    let mut filters = vec![FilterExpression::is(EVENT_NAME_FIELD, &filter.event_name)];

    if let (Some(network), Some(direction)) = (&filter.network, filter.directionality) {
        let term = match direction {
            Directionality::From => FilterExpression::is(FROM_FIELD, network),
            Directionality::To => FilterExpression::is(TO_FIELD, network),
            Directionality::Either => FilterExpression::any_of(vec![
                FilterExpression::is(FROM_FIELD, network),
                FilterExpression::is(TO_FIELD, network),
            ]),
        };
        filters.push(term);
    }

    filters
}
