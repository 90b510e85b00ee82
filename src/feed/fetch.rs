//! Feed sources and concurrent loading.
//!
//! Both feeds are started at once on the rayon pool. Each finished load is
//! delivered as a [`FeedEvent`] over a channel that the UI thread drains, so
//! neither feed waits on the other.

use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use tracing::{debug, error, info};

use super::{
    parse_collection, validate, EarthquakeFeature, FeedError, PlateBoundaryFeature, Validated,
};
use crate::style::ColorBy;

pub const EARTHQUAKES_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/1.0_month.geojson";
pub const PLATES_URL: &str =
    "https://raw.githubusercontent.com/fraxen/tectonicplates/master/GeoJSON/PB2002_boundaries.json";

/// Somewhere a feed body can be read from
pub trait FeedSource: Send + Sync {
    /// URL or path, for logs and error messages
    fn location(&self) -> &str;

    fn fetch(&self) -> Result<Vec<u8>, FeedError>;
}

/// GET over HTTP(S)
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl FeedSource for HttpSource {
    fn location(&self) -> &str {
        &self.url
    }

    fn fetch(&self) -> Result<Vec<u8>, FeedError> {
        let resp = self.client.get(&self.url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        Ok(resp.bytes()?.to_vec())
    }
}

/// Local file, given as a path or `file://` URL
pub struct FileSource {
    location: String,
    path: PathBuf,
}

impl FileSource {
    pub fn new(location: impl Into<String>) -> Self {
        let location = location.into();
        let path = PathBuf::from(location.strip_prefix("file://").unwrap_or(&location));
        Self { location, path }
    }
}

impl FeedSource for FileSource {
    fn location(&self) -> &str {
        &self.location
    }

    fn fetch(&self) -> Result<Vec<u8>, FeedError> {
        fs::read(&self.path).map_err(|source| FeedError::Io {
            path: self.location.clone(),
            source,
        })
    }
}

/// Blocking HTTP client shared by both feeds
pub fn http_client(timeout: Duration) -> Result<Client, FeedError> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Pick a source for a configured location
pub fn source_for(location: &str, client: &Client) -> Arc<dyn FeedSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Arc::new(HttpSource::new(client.clone(), location))
    } else {
        Arc::new(FileSource::new(location))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedKind {
    Earthquakes,
    TectonicPlates,
}

impl FeedKind {
    pub fn name(self) -> &'static str {
        match self {
            FeedKind::Earthquakes => "earthquakes",
            FeedKind::TectonicPlates => "tectonic plates",
        }
    }
}

/// Validated contents of one feed
#[derive(Debug)]
pub enum FeedPayload {
    Earthquakes(Validated<EarthquakeFeature>),
    TectonicPlates(Validated<PlateBoundaryFeature>),
}

/// Outcome of one feed load
#[derive(Debug)]
pub struct FeedEvent {
    pub kind: FeedKind,
    pub result: Result<FeedPayload, FeedError>,
}

/// Fetch, parse and validate one feed on the current thread
pub fn load_feed(
    kind: FeedKind,
    source: &dyn FeedSource,
    color_by: ColorBy,
) -> Result<FeedPayload, FeedError> {
    let features = parse_collection(source.fetch()?)?;
    debug!(feed = kind.name(), count = features.len(), "parsed feed");

    Ok(match kind {
        FeedKind::Earthquakes => FeedPayload::Earthquakes(validate(kind.name(), &features, |f| {
            EarthquakeFeature::from_feature(f, color_by)
        })),
        FeedKind::TectonicPlates => FeedPayload::TectonicPlates(validate(
            kind.name(),
            &features,
            PlateBoundaryFeature::from_feature,
        )),
    })
}

/// Load a feed in the background and send the outcome to `tx`
pub fn spawn_feed(
    kind: FeedKind,
    source: Arc<dyn FeedSource>,
    color_by: ColorBy,
    tx: Sender<FeedEvent>,
) {
    rayon::spawn(move || {
        info!(feed = kind.name(), location = source.location(), "fetching feed");
        let started = Instant::now();
        let result = load_feed(kind, source.as_ref(), color_by);

        match &result {
            Ok(_) => info!(
                feed = kind.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "feed loaded"
            ),
            Err(e) => error!(feed = kind.name(), location = source.location(), "feed failed: {e}"),
        }

        if tx.send(FeedEvent { kind, result }).is_err() {
            debug!(feed = kind.name(), "receiver dropped before feed completed");
        }
    });
}
