//! Reminder ticker: banner text plus at-most-once local notifications.
//!
//! A tick compares the wall clock (`HH:MM`) with the configured quote and
//! workout times. Each reminder category fires at most once per date and
//! time, however many ticks land in the same minute.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};

use crate::calendar::weekday_index;
use crate::models::{Settings, WorkoutMap};
use crate::quotes::QuoteSource;
use crate::util::truncate_with_ellipsis;

pub const QUOTE_TITLE: &str = "Motivation";
pub const WORKOUT_TITLE: &str = "Today's workout";
pub const EMPTY_WORKOUT_BODY: &str = "Open the app and fill in today's plan.";
const WORKOUT_BODY_MAX_CHARS: usize = 140;

/// Sink for user-visible notifications.
pub trait Notifier: Send + Sync {
    /// Whether notifications may be shown at all.
    fn permission(&self) -> bool;
    fn notify(&self, title: &str, body: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderKind {
    Quote,
    Workout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: ReminderKind,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub banner: String,
    pub notifications: Vec<Notification>,
}

/// Banner for the home view.
#[must_use]
pub fn banner_text(settings: &Settings, workout_today: bool) -> String {
    let first = if workout_today {
        format!("Workout today at {}", settings.workout_time)
    } else {
        format!("Rest day, next workout at {}", settings.workout_time)
    };
    format!("{first} \u{2014} Motivation at {}", settings.quote_time)
}

/// Notification body for today's workout note.
#[must_use]
pub fn workout_body(note: &str) -> String {
    let note = note.trim();
    if note.is_empty() {
        EMPTY_WORKOUT_BODY.to_string()
    } else {
        truncate_with_ellipsis(note, WORKOUT_BODY_MAX_CHARS)
    }
}

type FiredKey = (NaiveDate, String, ReminderKind);

pub struct ReminderTicker<Q, N> {
    quotes: Q,
    notifier: N,
    last_quote: Option<String>,
    fired: HashSet<FiredKey>,
    clock: fn() -> NaiveDateTime,
}

impl<Q: QuoteSource, N: Notifier> ReminderTicker<Q, N> {
    pub fn new(quotes: Q, notifier: N) -> Self {
        Self {
            quotes,
            notifier,
            last_quote: None,
            fired: HashSet::new(),
            clock: local_now,
        }
    }

    /// Replace the wall clock used by [`Self::run`].
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn last_quote(&self) -> Option<&str> {
        self.last_quote.as_deref()
    }

    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    pub async fn tick(
        &mut self,
        now: NaiveDateTime,
        settings: &Settings,
        workouts: &WorkoutMap,
    ) -> TickReport {
        let today = now.date();
        let day_index = weekday_index(today);
        let workout_today = settings.is_workout_day(day_index);
        let hhmm = now.format("%H:%M").to_string();
        self.fired.retain(|(date, _, _)| *date >= today);

        let mut notifications = Vec::new();
        if self.notifier.permission() {
            if hhmm == settings.quote_time && self.claim(today, &hhmm, ReminderKind::Quote) {
                let quote = self.quotes.fetch_quote(self.last_quote.as_deref()).await;
                self.last_quote = Some(quote.clone());
                notifications.push(Notification {
                    kind: ReminderKind::Quote,
                    title: QUOTE_TITLE.to_string(),
                    body: quote,
                });
            }
            if hhmm == settings.workout_time
                && workout_today
                && self.claim(today, &hhmm, ReminderKind::Workout)
            {
                notifications.push(Notification {
                    kind: ReminderKind::Workout,
                    title: WORKOUT_TITLE.to_string(),
                    body: workout_body(workouts.get(day_index)),
                });
            }
        }

        for notification in &notifications {
            self.notifier.notify(&notification.title, &notification.body);
        }

        TickReport {
            banner: banner_text(settings, workout_today),
            notifications,
        }
    }

    /// Tick immediately, then every `interval`, until `shutdown` resolves.
    ///
    /// `snapshot` is consulted on each tick; `None` (no settings yet) skips it.
    pub async fn run<S, Fut, F>(&mut self, interval: Duration, mut snapshot: S, shutdown: F)
    where
        S: FnMut() -> Fut,
        Fut: Future<Output = Option<(Settings, WorkoutMap)>>,
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::debug!("Reminder loop stopped");
                    return;
                }
                _ = ticker.tick() => {
                    let Some((settings, workouts)) = snapshot().await else {
                        continue;
                    };
                    let now = (self.clock)();
                    let report = self.tick(now, &settings, &workouts).await;
                    tracing::debug!(
                        "Reminder tick at {}: {} notification(s)",
                        now.format("%H:%M"),
                        report.notifications.len()
                    );
                }
            }
        }
    }

    fn claim(&mut self, date: NaiveDate, hhmm: &str, kind: ReminderKind) -> bool {
        self.fired.insert((date, hhmm.to_string(), kind))
    }
}

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
