use anyhow::{Context, anyhow};
use tracing::{debug, info, warn};

use crate::stay::{BookingRecord, ReservationRecord, Snapshot};

/// Client for the two upstream stay endpoints.
#[derive(Debug, Clone)]
pub struct StayService {
    base_url: String,
    client: reqwest::Client,
}

impl StayService {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("failed to build http client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub async fn fetch_bookings(&self) -> anyhow::Result<Vec<BookingRecord>> {
        self.fetch_collection("/booking/all").await
    }

    pub async fn fetch_reservations(&self) -> anyhow::Result<Vec<ReservationRecord>> {
        self.fetch_collection("/reservation/getAllReservations")
            .await
    }

    /// Issues both fetches concurrently and waits for both. The engine
    /// only ever sees a complete pair; a failure on either side fails
    /// the whole snapshot rather than leaving a half-applied state with
    /// wrong precedence.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_snapshot_records(
        &self,
    ) -> anyhow::Result<(Vec<BookingRecord>, Vec<ReservationRecord>)> {
        let (bookings, reservations) =
            tokio::try_join!(self.fetch_bookings(), self.fetch_reservations())?;

        info!(
            bookings = bookings.len(),
            reservations = reservations.len(),
            "fetched stay snapshot"
        );
        Ok((bookings, reservations))
    }

    /// Synchronous entry point for the CLI path.
    pub fn fetch_snapshot_records_blocking(
        &self,
    ) -> anyhow::Result<(Vec<BookingRecord>, Vec<ReservationRecord>)> {
        let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
        runtime.block_on(self.fetch_snapshot_records())
    }

    async fn fetch_collection<T>(&self, path: &str) -> anyhow::Result<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "fetching stay collection");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        if !response.status().is_success() {
            return Err(anyhow!("{url} returned status {}", response.status()));
        }

        response
            .json::<Vec<T>>()
            .await
            .with_context(|| format!("failed decoding response from {url}"))
    }
}

/// Generation ticket handed out when a snapshot request starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Holds the snapshot the engine resolves against, guarded against
/// stale responses: when a new request begins before a prior one
/// completes, the prior completion carries a superseded ticket and is
/// discarded without touching the current snapshot.
#[derive(Debug, Default)]
pub struct SnapshotCell {
    generation: u64,
    current: Option<Snapshot>,
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of a snapshot request; completions for any
    /// earlier ticket become stale from this point on.
    pub fn begin_request(&mut self) -> RequestTicket {
        self.generation += 1;
        RequestTicket(self.generation)
    }

    /// Applies a completed snapshot if the ticket is still current.
    /// Returns whether the snapshot was installed.
    pub fn complete(&mut self, ticket: RequestTicket, snapshot: Snapshot) -> bool {
        if ticket.0 != self.generation {
            warn!(
                ticket = ticket.0,
                current = self.generation,
                "discarding stale snapshot response"
            );
            return false;
        }

        self.current = Some(snapshot);
        true
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }
}
