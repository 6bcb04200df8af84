use crate::config::Settings;
use crate::domain::{Maturity, RateRow};
use crate::storage::RateStore;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::FindOptions;

pub const DATE_FIELD: &str = "Date";

#[derive(Debug, Clone)]
pub struct MongoRateStore {
    collection: mongodb::Collection<Document>,
}

impl MongoRateStore {
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let uri = settings.require_mongodb_string()?;
        let client = mongodb::Client::with_uri_str(uri)
            .await
            .context("invalid MONGODB_STRING")?;

        let db = match settings.database.as_deref() {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .context("MONGODB_STRING has no default database and HIBOR_DATABASE is unset")?,
        };

        tracing::debug!(
            database = db.name(),
            collection = %settings.collection,
            "mongodb rate store configured"
        );

        Ok(Self {
            collection: db.collection::<Document>(&settings.collection),
        })
    }
}

#[async_trait::async_trait]
impl RateStore for MongoRateStore {
    fn store_name(&self) -> &'static str {
        "mongodb"
    }

    async fn fetch_rows(&self, limit: usize) -> Result<Vec<RateRow>> {
        // `_id` descending puts the latest insert first when a date repeats.
        let options = FindOptions::builder()
            .sort(doc! { "Date": -1, "_id": -1 })
            .limit(i64::try_from(limit).context("fetch limit out of range")?)
            .build();

        let mut cursor = self
            .collection
            .find(doc! {}, options)
            .await
            .with_context(|| format!("find on {} failed", self.collection.name()))?;

        let mut rows = Vec::new();
        while let Some(document) = cursor
            .try_next()
            .await
            .context("reading rate documents failed")?
        {
            rows.push(row_from_document(&document)?);
        }
        Ok(rows)
    }
}

/// Decodes one stored fixing. `_id` and unknown fields are dropped.
pub fn row_from_document(document: &Document) -> Result<RateRow> {
    let date = match document.get(DATE_FIELD) {
        Some(value) => date_from_bson(value)?,
        None => anyhow::bail!("rate document is missing {DATE_FIELD}"),
    };

    let mut row = RateRow::new(date);
    for maturity in Maturity::ALL {
        let value = match document.get(maturity.label()) {
            None => None,
            Some(v) => rate_from_bson(v)
                .with_context(|| format!("invalid {maturity} rate for {date}"))?,
        };
        row.set(maturity, value);
    }
    Ok(row)
}

/// Calendar date of a stored timestamp; time-of-day is discarded.
fn date_from_bson(value: &Bson) -> Result<NaiveDate> {
    match value {
        Bson::DateTime(dt) => DateTime::from_timestamp_millis(dt.timestamp_millis())
            .map(|dt| dt.date_naive())
            .with_context(|| format!("{DATE_FIELD} out of range: {dt}")),
        Bson::String(s) => parse_date_str(s),
        other => anyhow::bail!(
            "{DATE_FIELD} must be a datetime or date string (got {:?})",
            other.element_type()
        ),
    }
}

fn parse_date_str(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    let dt = DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("unparseable {DATE_FIELD}: {s}"))?;
    Ok(dt.naive_utc().date())
}

fn rate_from_bson(value: &Bson) -> Result<Option<f64>> {
    match value {
        Bson::Null => Ok(None),
        Bson::Double(v) if v.is_nan() => Ok(None),
        Bson::Double(v) => Ok(Some(*v)),
        Bson::Int32(v) => Ok(Some(f64::from(*v))),
        Bson::Int64(v) => Ok(Some(*v as f64)),
        other => anyhow::bail!("expected a number or null (got {:?})", other.element_type()),
    }
}
