use chrono::{DateTime, SecondsFormat, Utc};

pub(crate) trait Clock {
    fn now(&self) -> DateTime<Utc>;

    fn epoch_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }

    fn iso_timestamp(&self) -> String {
        self.now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedClock(pub(crate) DateTime<Utc>);

#[cfg(test)]
impl FixedClock {
    pub(crate) fn at_millis(millis: i64) -> Self {
        Self(DateTime::from_timestamp_millis(millis).expect("valid timestamp"))
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
