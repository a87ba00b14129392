//! Timeseries readings and the paginated cursor over them.
//!
//! A resource with timeseries capability exposes a time-ordered
//! sub-collection of [`DataPoint`]s. The [`Timeseries`] cursor pages
//! through it lazily, following server-provided continuation links in a
//! fixed direction; [`Timeseries::live`] opens the server-push variant.

use std::collections::VecDeque;

use chrono::{DateTime, SecondsFormat, Utc};
use futures::Stream;
use serde_json::{Map, Value};
use url::Url;

use crate::error::{Error, Result};
use crate::jsonapi::{self, Links, PrimaryData};
use crate::live::LiveStream;
use crate::resource::{resource_type, Resource, ResourceObject};
use crate::session::{expect_document, Session};

/// One timeseries reading.
///
/// Carries a `port` (string tag), a [`PointValue`] and an ISO8601
/// timestamp. Points fetched through an aggregation query expose the
/// aggregate variant of the value.
#[derive(Debug, Clone)]
pub struct DataPoint {
    object: ResourceObject,
}

resource_type!(DataPoint, kind: "data-point", path: "timeseries");

impl DataPoint {
    /// The port this reading was posted on.
    pub fn port(&self) -> Result<&str> {
        self.attributes()
            .string("port")
            .ok_or_else(|| Error::NoAttribute("port".to_string()))
    }

    /// The reading's value.
    pub fn value(&self) -> Result<PointValue> {
        Ok(PointValue::from_json(self.attributes().require("value")?))
    }

    /// When the reading was taken.
    pub fn timestamp(&self) -> Result<DateTime<Utc>> {
        self.attributes()
            .timestamp("timestamp")
            .ok_or_else(|| Error::NoAttribute("timestamp".to_string()))
    }

    /// The originating sensor, when the server reports it.
    pub fn sensor_id(&self) -> Option<&str> {
        self.attributes().string("sensor_id")
    }
}

/// The value of a reading.
///
/// Aggregated queries return a min/max/avg triple in place of the raw
/// scalar; the two cases are distinct variants so aggregate values cannot
/// be mistaken for scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum PointValue {
    /// A raw reading (arbitrary JSON).
    Scalar(Value),
    /// An aggregate over a time bucket.
    Aggregate(Aggregate),
}

impl PointValue {
    /// Structurally detect the aggregate shape: a non-empty JSON object
    /// whose keys are a subset of `min`/`max`/`avg`.
    pub fn from_json(value: &Value) -> Self {
        if let Value::Object(map) = value {
            if !map.is_empty() && map.keys().all(|k| k == "min" || k == "max" || k == "avg") {
                return PointValue::Aggregate(Aggregate {
                    min: map.get("min").and_then(Value::as_f64),
                    max: map.get("max").and_then(Value::as_f64),
                    avg: map.get("avg").and_then(Value::as_f64),
                });
            }
        }
        PointValue::Scalar(value.clone())
    }
}

/// A min/max/avg triple returned by aggregation queries.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aggregate {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

/// Which continuation link a cursor follows.
///
/// `Prev` pages descending through time from the starting cursor, `Next`
/// ascending. Fixed at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Prev,
    Next,
}

impl Direction {
    fn link(&self, links: &Links) -> Option<String> {
        match self {
            Direction::Prev => links.prev.clone(),
            Direction::Next => links.next.clone(),
        }
    }
}

/// Filters and paging for a timeseries cursor, fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct TimeseriesOptions {
    /// Entries per page (`page[size]`).
    pub page_size: Option<u32>,
    /// Point id to anchor the first page at (`page[id]`).
    pub start_id: Option<String>,
    /// Which way to page through time.
    pub direction: Direction,
    /// Only readings on this port (`filter[port]`).
    pub port: Option<String>,
    /// Only readings at or after this ISO8601 time (`filter[start]`).
    pub start: Option<String>,
    /// Only readings before this ISO8601 time (`filter[end]`).
    pub end: Option<String>,
    /// Aggregation bucket operation, e.g. `min,max,avg` (`agg[type]`).
    pub agg_type: Option<String>,
    /// Aggregation bucket size, e.g. `1h` (`agg[size]`).
    pub agg_size: Option<String>,
}

impl TimeseriesOptions {
    fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(size) = self.page_size {
            params.push(("page[size]".to_string(), size.to_string()));
        }
        if let Some(port) = &self.port {
            params.push(("filter[port]".to_string(), port.clone()));
        }
        if let Some(start) = &self.start {
            params.push(("filter[start]".to_string(), start.clone()));
        }
        if let Some(end) = &self.end {
            params.push(("filter[end]".to_string(), end.clone()));
        }
        if let Some(agg_type) = &self.agg_type {
            params.push(("agg[type]".to_string(), agg_type.clone()));
        }
        if let Some(agg_size) = &self.agg_size {
            params.push(("agg[size]".to_string(), agg_size.clone()));
        }
        params
    }
}

/// A lazy cursor over a resource's timeseries.
///
/// Pulls one page at a time: [`Timeseries::next`] yields queued entries in
/// server order, fetching the continuation URL with the cursor's fixed
/// filters whenever the queue runs dry, and terminates once the queue is
/// empty and no continuation remains. A cursor is not restartable; call
/// the owning resource's `timeseries()` again for a fresh one.
pub struct Timeseries {
    session: Session,
    base_url: Url,
    continuation: Option<Url>,
    queue: VecDeque<DataPoint>,
    params: Vec<(String, String)>,
    start_id: Option<String>,
    started: bool,
    direction: Direction,
}

impl Timeseries {
    pub(crate) fn new(session: Session, base_url: Url, options: TimeseriesOptions) -> Self {
        Self {
            session,
            continuation: Some(base_url.clone()),
            base_url,
            queue: VecDeque::new(),
            params: options.params(),
            start_id: options.start_id.clone(),
            started: false,
            direction: options.direction,
        }
    }

    /// Yield the next reading, or `None` once the sequence is exhausted.
    pub async fn next(&mut self) -> Result<Option<DataPoint>> {
        loop {
            if let Some(point) = self.queue.pop_front() {
                return Ok(Some(point));
            }
            let Some(url) = self.continuation.take() else {
                return Ok(None);
            };

            let mut query = self.params.clone();
            if !self.started {
                // The anchor only applies to the first page; continuation
                // URLs carry their own cursor.
                if let Some(id) = &self.start_id {
                    query.push(("page[id]".to_string(), id.clone()));
                }
            }
            self.started = true;

            let response = self.session.get(url, &query).await?;
            let doc = expect_document(&response, 200)?;

            match doc.data {
                Some(PrimaryData::Many(items)) => {
                    for data in items {
                        self.queue.push_back(DataPoint::from_object(
                            ResourceObject::from_related(data, self.session.clone()),
                        ));
                    }
                }
                // A page holding a single object is still a page.
                Some(PrimaryData::One(data)) => {
                    self.queue.push_back(DataPoint::from_object(
                        ResourceObject::from_related(data, self.session.clone()),
                    ));
                }
                None => {}
            }
            self.continuation = match self.direction.link(&doc.links) {
                Some(link) => Some(Url::parse(&link)?),
                None => None,
            };
        }
    }

    /// Collect up to `n` readings.
    pub async fn take(&mut self, n: usize) -> Result<Vec<DataPoint>> {
        let mut points = Vec::with_capacity(n);
        while points.len() < n {
            match self.next().await? {
                Some(point) => points.push(point),
                None => break,
            }
        }
        Ok(points)
    }

    /// Convert the cursor into a [`futures::Stream`] of readings.
    pub fn into_stream(self) -> impl Stream<Item = Result<DataPoint>> + Send {
        futures::stream::try_unfold(self, |mut cursor| async move {
            Ok(cursor.next().await?.map(|point| (point, cursor)))
        })
    }

    /// Post a single new reading. The server assigns the id and, when no
    /// timestamp is given, the time of arrival.
    pub async fn create(
        &self,
        port: &str,
        value: Value,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<DataPoint> {
        let mut attributes = Map::new();
        attributes.insert("port".to_string(), Value::String(port.to_string()));
        attributes.insert("value".to_string(), value);
        if let Some(timestamp) = timestamp {
            attributes.insert(
                "timestamp".to_string(),
                Value::String(timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
        let body = jsonapi::resource_body(DataPoint::KIND, None, Some(attributes), None);
        let response = self.session.post(self.base_url.clone(), Some(body)).await?;
        let doc = expect_document(&response, 201)?;
        DataPoint::one_from(&self.session, doc, &[], false)
    }

    /// Open the live (server-push) variant of this timeseries.
    ///
    /// The returned stream holds the underlying connection until it is
    /// closed or dropped; consume it in a scope that guarantees release.
    pub async fn live(&self) -> Result<LiveStream> {
        let url = Url::parse(&format!("{}/live", self.base_url))?;
        let stream = self.session.stream(url, &[]).await?;
        Ok(LiveStream::new(stream, self.session.clone()))
    }
}

impl std::fmt::Debug for Timeseries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timeseries")
            .field("base_url", &self.base_url.as_str())
            .field("direction", &self.direction)
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}

/// Timeseries capability for a resource type.
pub trait HasTimeseries: Resource {
    /// Construct a fresh cursor over this resource's timeseries.
    fn timeseries(&self, options: TimeseriesOptions) -> Result<Timeseries> {
        let object = self.object();
        let mut segments = vec![Self::PATH];
        if !object.is_singleton() {
            segments.push(object.require_id()?);
        }
        segments.push("timeseries");
        let url = object.session().build_url(&segments)?;
        Ok(Timeseries::new(object.session().clone(), url, options))
    }
}
