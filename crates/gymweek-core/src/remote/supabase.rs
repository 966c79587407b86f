//! PostgREST implementation of [`RemoteStore`].

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use super::{CurrentSession, RemoteStore};
use crate::auth::{AuthSession, AuthUser};
use crate::error::{Error, Result};
use crate::models::{PendingProfile, Settings, WorkoutMap, MAX_DAY_INDEX};
use crate::util::{capitalize_first, is_http_url, normalize_text_option, parse_api_error};

const TABLE_SETTINGS: &str = "user_settings";
const TABLE_WORKOUTS: &str = "user_workouts_weekly";
const TABLE_PROFILES: &str = "profiles";
const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=minimal";

#[derive(Clone)]
pub struct SupabaseRemoteStore {
    rest_url: String,
    anon_key: String,
    client: Client,
    session: CurrentSession,
}

impl SupabaseRemoteStore {
    pub fn new(
        url: impl AsRef<str>,
        anon_key: impl Into<String>,
        session: CurrentSession,
    ) -> Result<Self> {
        let rest_url = normalize_rest_url(url.as_ref())?;
        let anon_key = normalize_text_option(Some(anon_key.into())).ok_or_else(|| {
            Error::InvalidInput("Supabase anon key must not be empty".to_string())
        })?;
        Ok(Self {
            rest_url,
            anon_key,
            client: Client::builder().build()?,
            session,
        })
    }

    fn authorized(&self, request: RequestBuilder, session: &AuthSession) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .header("Accept", "application/json")
    }

    async fn select<T: for<'de> Deserialize<'de>>(
        &self,
        table: &str,
        columns: &str,
        filter: (&str, String),
    ) -> Result<Vec<T>> {
        let session = self.session.require()?;
        let request = self.authorized(
            self.client
                .get(format!("{}/{table}", self.rest_url))
                .query(&[("select", columns.to_string()), (filter.0, filter.1)]),
            &session,
        );
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(parse_api_error(status, &body)));
        }
        Ok(response.json::<Vec<T>>().await?)
    }

    async fn upsert<T: Serialize + Sync>(
        &self,
        table: &str,
        on_conflict: &str,
        payload: &T,
        session: &AuthSession,
    ) -> Result<()> {
        let request = self.authorized(
            self.client
                .post(format!("{}/{table}", self.rest_url))
                .query(&[("on_conflict", on_conflict)])
                .header("Prefer", UPSERT_PREFER)
                .json(payload),
            session,
        );
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(parse_api_error(status, &body)));
        }
        Ok(())
    }
}

impl RemoteStore for SupabaseRemoteStore {
    async fn load_settings(&self) -> Result<Option<Settings>> {
        let user_id = self.session.require()?.user.id;
        let rows: Vec<SettingsRow> = self
            .select(
                TABLE_SETTINGS,
                "workouts_per_week,selected_days,workout_time,quote_time",
                ("user_id", format!("eq.{user_id}")),
            )
            .await?;
        Ok(rows.into_iter().next().map(SettingsRow::into_settings))
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let session = self.session.require()?;
        let payload = SettingsPayload {
            user_id: &session.user.id,
            workouts_per_week: settings.workouts_per_week,
            selected_days: settings.selected_days.iter().copied().collect(),
            workout_time: &settings.workout_time,
            quote_time: &settings.quote_time,
        };
        self.upsert(TABLE_SETTINGS, "user_id", &payload, &session)
            .await
    }

    async fn load_workouts(&self) -> Result<WorkoutMap> {
        let user_id = self.session.require()?.user.id;
        let rows: Vec<WorkoutRow> = self
            .select(
                TABLE_WORKOUTS,
                "day_index,content",
                ("user_id", format!("eq.{user_id}")),
            )
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let day = u8::try_from(row.day_index)
                    .ok()
                    .filter(|day| *day <= MAX_DAY_INDEX)?;
                Some((day, row.content.unwrap_or_default()))
            })
            .collect())
    }

    async fn save_workout_day(&self, day_index: u8, text: &str) -> Result<()> {
        crate::models::validate_day_index(day_index)?;
        let session = self.session.require()?;
        let payload = WorkoutPayload {
            user_id: &session.user.id,
            day_index,
            content: text,
        };
        self.upsert(TABLE_WORKOUTS, "user_id,day_index", &payload, &session)
            .await
    }

    async fn save_workouts(&self, workouts: &WorkoutMap) -> Result<()> {
        let session = self.session.require()?;
        let week = workouts.full_week();
        let rows: Vec<WorkoutPayload<'_>> = week
            .iter()
            .map(|(day_index, content)| WorkoutPayload {
                user_id: &session.user.id,
                day_index: *day_index,
                content,
            })
            .collect();
        self.upsert(TABLE_WORKOUTS, "user_id,day_index", &rows, &session)
            .await
    }

    async fn upsert_profile(&self, user: &AuthUser, profile: &PendingProfile) -> Result<()> {
        let session = self.session.require()?;
        let payload = ProfilePayload {
            id: &user.id,
            email: user.email.as_deref().unwrap_or(&profile.email),
            first_name: &profile.first_name,
            last_name: &profile.last_name,
            birth_date: &profile.birth_date,
            nationality: &profile.nationality,
        };
        self.upsert(TABLE_PROFILES, "id", &payload, &session).await
    }

    async fn load_first_name(&self) -> Result<Option<String>> {
        let user_id = self.session.require()?.user.id;
        let rows: Vec<FirstNameRow> = self
            .select(TABLE_PROFILES, "first_name", ("id", format!("eq.{user_id}")))
            .await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.first_name)
            .map(|name| capitalize_first(&name))
            .filter(|name| !name.is_empty()))
    }
}

fn normalize_rest_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() || !is_http_url(trimmed) {
        return Err(Error::InvalidInput(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }
    if trimmed.ends_with("/rest/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/rest/v1"))
    }
}

#[derive(Debug, Deserialize)]
struct SettingsRow {
    workouts_per_week: i64,
    selected_days: Option<Vec<i64>>,
    workout_time: String,
    quote_time: String,
}

impl SettingsRow {
    fn into_settings(self) -> Settings {
        Settings {
            workouts_per_week: crate::models::clamp_workouts_per_week(self.workouts_per_week),
            selected_days: self
                .selected_days
                .unwrap_or_default()
                .into_iter()
                .filter_map(|day| u8::try_from(day).ok().filter(|day| *day <= MAX_DAY_INDEX))
                .collect(),
            workout_time: trim_seconds(&self.workout_time),
            quote_time: trim_seconds(&self.quote_time),
        }
    }
}

/// Postgres `time` columns come back as `HH:MM:SS`.
fn trim_seconds(value: &str) -> String {
    value.trim().chars().take(5).collect()
}

#[derive(Debug, Deserialize)]
struct WorkoutRow {
    day_index: i64,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirstNameRow {
    first_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct SettingsPayload<'a> {
    user_id: &'a str,
    workouts_per_week: u8,
    selected_days: Vec<u8>,
    workout_time: &'a str,
    quote_time: &'a str,
}

#[derive(Debug, Serialize)]
struct WorkoutPayload<'a> {
    user_id: &'a str,
    day_index: u8,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ProfilePayload<'a> {
    id: &'a str,
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    birth_date: &'a str,
    nationality: &'a str,
}
