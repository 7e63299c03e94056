use biometrics::{Collector, Counter};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("hubbub.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("hubbub.client.request_errors");
pub(crate) static CLIENT_TOKEN_REFRESHES: Counter = Counter::new("hubbub.client.token_refreshes");

pub(crate) static SESSION_COMMANDS: Counter = Counter::new("hubbub.session.commands");
pub(crate) static SESSION_UNSUPPORTED: Counter = Counter::new("hubbub.session.unsupported");

pub(crate) static MONITOR_EVENTS: Counter = Counter::new("hubbub.monitor.events");

pub(crate) static BOOTSTRAP_RETRIES: Counter = Counter::new("hubbub.bootstrap.retries");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_TOKEN_REFRESHES);

    collector.register_counter(&SESSION_COMMANDS);
    collector.register_counter(&SESSION_UNSUPPORTED);

    collector.register_counter(&MONITOR_EVENTS);

    collector.register_counter(&BOOTSTRAP_RETRIES);
}
