//! `chrome.alarms`: delayed, fire-once notifications.
//!
//! Each alarm is an independent one-shot timer. When it expires the alarm is
//! emitted on [`Alarms::on_alarm`] and forgotten. Alarms are not deduplicated
//! by name and cannot be cancelled.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::AlarmsConfig;
use crate::diagnostics::{Diagnostics, TARGET};
use crate::event::EventChannel;

/// Payload emitted when an alarm fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub name: String,
    /// Milliseconds since the Unix epoch at which the alarm fired.
    pub scheduled_time: u64,
}

/// A fully resolved alarm request.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmSpec {
    pub name: String,
    pub delay: Duration,
}

impl AlarmSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delay: Duration::ZERO,
        }
    }

    /// Set the delay in (possibly fractional) minutes. Negative or NaN means none.
    pub fn delay_in_minutes(mut self, minutes: f64) -> Self {
        self.delay = minutes_to_delay(minutes);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// The options object accepted by `alarms.create`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlarmCreateInfo {
    pub name: Option<String>,
    pub delay_in_minutes: Option<f64>,
}

/// The two call shapes of `alarms.create`.
#[derive(Debug, Clone, PartialEq)]
pub enum AlarmArgs {
    /// `create(name, info)`
    Named(String, AlarmCreateInfo),
    /// `create(info)`, the name carried inside the options.
    Info(AlarmCreateInfo),
}

impl AlarmArgs {
    /// Resolve into an [`AlarmSpec`], using `default_name` when no name is given.
    pub fn into_spec(self, default_name: &str) -> AlarmSpec {
        let (name, info) = match self {
            AlarmArgs::Named(name, info) => (name, info),
            AlarmArgs::Info(info) => {
                let name = info
                    .name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| default_name.to_string());
                (name, info)
            }
        };
        AlarmSpec::new(name).delay_in_minutes(info.delay_in_minutes.unwrap_or(0.0))
    }
}

fn minutes_to_delay(minutes: f64) -> Duration {
    if minutes.is_finite() && minutes > 0.0 {
        Duration::try_from_secs_f64(minutes * 60.0).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub struct Alarms {
    default_name: String,
    on_alarm: Arc<EventChannel<Alarm>>,
    diagnostics: Diagnostics,
}

impl Alarms {
    pub fn new(config: &AlarmsConfig, diagnostics: Diagnostics) -> Self {
        Self {
            default_name: config.default_name.clone(),
            on_alarm: Arc::new(EventChannel::new("alarms.onAlarm")),
            diagnostics,
        }
    }

    pub fn on_alarm(&self) -> &EventChannel<Alarm> {
        &self.on_alarm
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Schedule a one-shot alarm.
    ///
    /// Runs on the current tokio runtime when there is one, otherwise on a
    /// dedicated timer thread.
    pub fn create(&self, spec: AlarmSpec) {
        self.diagnostics.record(
            "alarms.create",
            format_args!("{} delay={:?}", spec.name, spec.delay),
        );

        let channel = Arc::clone(&self.on_alarm);
        let AlarmSpec { name, delay } = spec;
        let fire = move || {
            channel.emit(&Alarm {
                name,
                scheduled_time: now_millis(),
            });
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    fire();
                });
            }
            Err(_) => {
                let spawned = std::thread::Builder::new()
                    .name("chromock-alarm".to_string())
                    .spawn(move || {
                        std::thread::sleep(delay);
                        fire();
                    });
                if let Err(e) = spawned {
                    tracing::error!(target: TARGET, "Failed to start alarm timer: {}", e);
                }
            }
        }
    }

    /// Schedule an alarm from either JS call shape.
    pub fn create_from(&self, args: AlarmArgs) {
        let spec = args.into_spec(&self.default_name);
        self.create(spec);
    }
}

impl fmt::Debug for Alarms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alarms")
            .field("default_name", &self.default_name)
            .field("on_alarm", &self.on_alarm)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::listener;

    fn alarms() -> Alarms {
        Alarms::new(&AlarmsConfig::default(), Diagnostics::disabled())
    }

    #[test]
    fn test_args_named() {
        let spec = AlarmArgs::Named(
            "refresh".to_string(),
            AlarmCreateInfo {
                name: Some("ignored".to_string()),
                delay_in_minutes: Some(0.5),
            },
        )
        .into_spec("fallback");
        assert_eq!(spec.name, "refresh");
        assert_eq!(spec.delay, Duration::from_secs(30));
    }

    #[test]
    fn test_args_info_and_default_name() {
        let spec = AlarmArgs::Info(AlarmCreateInfo {
            name: Some("inside".to_string()),
            delay_in_minutes: None,
        })
        .into_spec("fallback");
        assert_eq!(spec, AlarmSpec::new("inside"));

        let spec = AlarmArgs::Info(AlarmCreateInfo::default()).into_spec("fallback");
        assert_eq!(spec.name, "fallback");
        assert_eq!(spec.delay, Duration::ZERO);
    }

    #[test]
    fn test_bad_delays_mean_zero() {
        assert_eq!(AlarmSpec::new("x").delay_in_minutes(-3.0).delay, Duration::ZERO);
        assert_eq!(AlarmSpec::new("x").delay_in_minutes(f64::NAN).delay, Duration::ZERO);
        assert_eq!(
            AlarmSpec::new("x").delay_in_minutes(f64::INFINITY).delay,
            Duration::ZERO
        );
    }

    #[test]
    fn test_huge_delays_saturate() {
        assert_eq!(AlarmSpec::new("x").delay_in_minutes(1e300).delay, Duration::MAX);
        assert_eq!(AlarmSpec::new("x").delay_in_minutes(f64::MAX).delay, Duration::MAX);

        let args = AlarmArgs::Named(
            "far".to_string(),
            AlarmCreateInfo {
                delay_in_minutes: Some(1e300),
                ..Default::default()
            },
        );
        assert_eq!(args.into_spec("unused").delay, Duration::MAX);
    }

    #[test]
    fn test_create_info_deserializes_camel_case() {
        let info: AlarmCreateInfo =
            serde_json::from_str(r#"{"name":"n","delayInMinutes":2}"#).unwrap();
        assert_eq!(info.name.as_deref(), Some("n"));
        assert_eq!(info.delay_in_minutes, Some(2.0));
    }

    #[tokio::test]
    async fn test_alarm_fires_once() {
        let alarms = alarms();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        alarms.on_alarm().subscribe(listener(move |alarm: &Alarm| {
            let _ = tx.send(alarm.clone());
        }));

        let before = now_millis();
        alarms.create(AlarmSpec::new("x").delay_in_minutes(0.0));

        let alarm = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alarm.name, "x");
        assert!(alarm.scheduled_time >= before);

        let extra = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(extra.is_err());
    }

    #[tokio::test]
    async fn test_same_name_fires_twice() {
        let alarms = alarms();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        alarms.on_alarm().subscribe(listener(move |alarm: &Alarm| {
            let _ = tx.send(alarm.name.clone());
        }));

        alarms.create_from(AlarmArgs::Named("x".to_string(), AlarmCreateInfo::default()));
        alarms.create_from(AlarmArgs::Named("x".to_string(), AlarmCreateInfo::default()));

        for _ in 0..2 {
            let name = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap();
            assert_eq!(name.as_deref(), Some("x"));
        }
        let extra = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(extra.is_err());
    }

    #[test]
    fn test_alarm_fires_without_runtime() {
        let alarms = alarms();
        let (tx, rx) = std::sync::mpsc::channel();
        let tx = parking_lot::Mutex::new(tx);
        alarms.on_alarm().subscribe(listener(move |alarm: &Alarm| {
            let _ = tx.lock().send(alarm.name.clone());
        }));

        alarms.create_from(AlarmArgs::Info(AlarmCreateInfo::default()));

        let name = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(name, "chromock-alarm");
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }
}
