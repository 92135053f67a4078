//! Request classification and orchestration
//!
//! Every stream request runs the same pipeline: validate the request-supplied
//! parts, look the video up in the catalog, ask the access gate, resolve the
//! object key, then either sign and rewrite a playlist or fetch a segment. The
//! processed-video family skips the catalog and the access gate and uses the
//! deterministic key layout instead. Any failing stage ends the request; nothing
//! is retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use streamgate_core::constants::{
    PROCESSED_ROUTE_PREFIX, PROXY_SEGMENT_ROUTE, UNIFIED_ROUTE, V1_ROUTE_PREFIX,
    VIDEOS_ROUTE_PREFIX,
};
use streamgate_core::validation::{
    validate_processed_id, validate_quality, validate_segment_name, validate_segment_path,
    validate_video_id,
};
use streamgate_core::{
    AccessGate, AppError, Catalog, Config, ObjectKey, Principal, RequestShape, SegmentDelivery,
};
use streamgate_storage::{ByteStream, Storage};

use crate::fetcher::SegmentFetcher;
use crate::keys::{resolve, KeySource};
use crate::playlist::{
    encode_path_segment, rewrite_playlist, LineTransformer, ProxyTransformer,
    SignedUrlTransformer,
};
use crate::signer::Signer;

/// The HTTP route family a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteFamily {
    /// Master playlist whose variants point back at the query-parameter route.
    MasterStream,
    /// Query-parameter route; shape decided by `resolution`/`segment`.
    UnifiedQuery,
    /// Deterministic `videos/{id}/{quality}/...` layout without catalog lookup.
    Processed,
    /// Catalog-backed variant playlists and segments, proxied.
    V1,
    /// Catalog-backed master playlist, proxied.
    V1ProxyMaster,
    /// Catalog-backed segment addressed by a base-relative path.
    V1ProxySegment,
}

impl RouteFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteFamily::MasterStream => "master_stream",
            RouteFamily::UnifiedQuery => "unified_query",
            RouteFamily::Processed => "processed",
            RouteFamily::V1 => "v1",
            RouteFamily::V1ProxyMaster => "v1_proxy_master",
            RouteFamily::V1ProxySegment => "v1_proxy_segment",
        }
    }

    /// Segments in playlists on these routes are signed object-store URLs.
    fn signs_playlists(&self) -> bool {
        matches!(self, RouteFamily::MasterStream | RouteFamily::UnifiedQuery)
    }

    /// Reject shapes a family cannot produce from its routes.
    fn check_shape(&self, shape: &RequestShape) -> Result<(), AppError> {
        let ok = match (self, shape) {
            (RouteFamily::MasterStream | RouteFamily::V1ProxyMaster, RequestShape::Master) => true,
            (RouteFamily::UnifiedQuery, RequestShape::Segment { quality: None, .. }) => {
                return Err(AppError::InvalidInput(
                    "segment requires a resolution".to_string(),
                ))
            }
            (RouteFamily::UnifiedQuery, _) => true,
            (
                RouteFamily::Processed | RouteFamily::V1,
                RequestShape::Variant { .. } | RequestShape::Segment { quality: Some(_), .. },
            ) => true,
            (RouteFamily::V1ProxySegment, RequestShape::Segment { quality: None, .. }) => true,
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(AppError::InvalidInput(format!(
                "{} request is not served on the {} route",
                shape.name(),
                self.as_str()
            )))
        }
    }
}

/// One inbound stream request, after the HTTP layer extracted its parts.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub family: RouteFamily,
    pub video_id: String,
    pub shape: RequestShape,
    pub principal: Principal,
}

/// What the HTTP layer should send back.
pub enum GatewayResponse {
    Playlist {
        body: String,
        max_age_secs: u64,
    },
    Segment {
        body: ByteStream,
        content_type: String,
        content_length: Option<u64>,
        max_age_secs: u64,
    },
    /// Temporary redirect to a signed URL.
    Redirect { location: String },
}

impl std::fmt::Debug for GatewayResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayResponse::Playlist { body, max_age_secs } => f
                .debug_struct("Playlist")
                .field("len", &body.len())
                .field("max_age_secs", max_age_secs)
                .finish(),
            GatewayResponse::Segment {
                content_type,
                content_length,
                ..
            } => f
                .debug_struct("Segment")
                .field("content_type", content_type)
                .field("content_length", content_length)
                .finish_non_exhaustive(),
            GatewayResponse::Redirect { location } => f
                .debug_struct("Redirect")
                .field("location", location)
                .finish(),
        }
    }
}

/// Delivery knobs taken from configuration.
#[derive(Debug, Clone)]
pub struct DeliverySettings {
    pub signed_url_ttl: Duration,
    pub segment_extension: String,
    pub segment_content_type: String,
    pub allowed_qualities: Vec<String>,
    pub segment_delivery: SegmentDelivery,
    pub processed_prefix: String,
    pub playlist_max_age_secs: u64,
    pub segment_max_age_secs: u64,
}

impl DeliverySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            signed_url_ttl: config.signed_url_ttl(),
            segment_extension: config.segment_extension().to_string(),
            segment_content_type: config.segment_content_type().to_string(),
            allowed_qualities: config.allowed_qualities().to_vec(),
            segment_delivery: config.segment_delivery(),
            processed_prefix: config.processed_video_prefix().to_string(),
            playlist_max_age_secs: config.playlist_cache_max_age_secs(),
            segment_max_age_secs: config.segment_cache_max_age_secs(),
        }
    }
}

impl Default for DeliverySettings {
    fn default() -> Self {
        DeliverySettings::from_config(&Config::new(Default::default()))
    }
}

/// The stream request orchestrator.
#[derive(Clone)]
pub struct Gateway {
    catalog: Arc<dyn Catalog>,
    access: Arc<dyn AccessGate>,
    signer: Signer,
    fetcher: SegmentFetcher,
    settings: Arc<DeliverySettings>,
}

impl Gateway {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        access: Arc<dyn AccessGate>,
        storage: Arc<dyn Storage>,
        settings: DeliverySettings,
    ) -> Self {
        Self {
            catalog,
            access,
            signer: Signer::new(storage.clone(), settings.signed_url_ttl),
            fetcher: SegmentFetcher::new(storage, settings.segment_content_type.clone()),
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &DeliverySettings {
        &self.settings
    }

    #[tracing::instrument(
        skip(self, request),
        fields(
            route_family = request.family.as_str(),
            video_id = %request.video_id,
            shape = request.shape.name(),
        )
    )]
    pub async fn handle(&self, request: StreamRequest) -> Result<GatewayResponse, AppError> {
        let start = Instant::now();
        let StreamRequest {
            family,
            video_id,
            shape,
            principal,
        } = request;

        // Everything request-supplied is checked before any I/O
        self.validate(family, &video_id, &shape)?;

        let record;
        let source = if family == RouteFamily::Processed {
            // TODO(security): processed ids skip catalog and access checks; confirm the
            // upstream token that is supposed to protect this route family
            KeySource::Processed {
                prefix: &self.settings.processed_prefix,
                video_id: &video_id,
            }
        } else {
            record = self
                .catalog
                .get_video_by_logical_id(&video_id)
                .await?
                .ok_or_else(|| AppError::not_found("Video not found"))?;

            self.access
                .check(&principal, &record)
                .await?
                .into_result()
                .inspect_err(|e| {
                    tracing::warn!(subject = ?principal.subject, error = %e, "Access denied");
                })?;

            KeySource::Catalog(&record)
        };

        let key = resolve(source, &shape)?;
        let response = match shape {
            RequestShape::Master | RequestShape::Variant { .. } => {
                self.playlist(family, &video_id, &source.base_prefix(), &key)
                    .await?
            }
            RequestShape::Segment { .. } => self.segment(family, &key).await?,
        };

        tracing::debug!(
            storage_key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stream request served"
        );

        Ok(response)
    }

    fn validate(
        &self,
        family: RouteFamily,
        video_id: &str,
        shape: &RequestShape,
    ) -> Result<(), AppError> {
        if family == RouteFamily::Processed {
            validate_processed_id(video_id)?;
        } else {
            validate_video_id(video_id)?;
        }

        family.check_shape(shape)?;

        let extension = &self.settings.segment_extension;
        match shape {
            RequestShape::Master => Ok(()),
            RequestShape::Variant { quality } => {
                validate_quality(quality, &self.settings.allowed_qualities)
            }
            RequestShape::Segment {
                quality: Some(quality),
                segment,
            } => {
                validate_quality(quality, &self.settings.allowed_qualities)?;
                validate_segment_name(segment, extension)
            }
            RequestShape::Segment {
                quality: None,
                segment,
            } => validate_segment_path(segment, extension),
        }
    }

    async fn playlist(
        &self,
        family: RouteFamily,
        video_id: &str,
        video_base: &str,
        key: &ObjectKey,
    ) -> Result<GatewayResponse, AppError> {
        let text = self.fetcher.fetch_playlist(key).await?;

        // Route bases carry the id as one path segment; processed ids may hold
        // characters that would otherwise split or end the path
        let id_segment = encode_path_segment(video_id);
        let transformer: Box<dyn LineTransformer> = if family.signs_playlists() {
            let variant_route = format!("{}/{}/{}", VIDEOS_ROUTE_PREFIX, id_segment, UNIFIED_ROUTE);
            Box::new(
                SignedUrlTransformer::new(self.signer.clone(), key, video_base)
                    .with_variant_route(variant_route),
            )
        } else if family == RouteFamily::Processed {
            Box::new(ProxyTransformer::new(
                key,
                video_base,
                format!("{}/{}", PROCESSED_ROUTE_PREFIX, id_segment),
            ))
        } else {
            let route_base = format!("{}/{}", V1_ROUTE_PREFIX, id_segment);
            let fallback = format!("{}/{}", route_base, PROXY_SEGMENT_ROUTE);
            Box::new(ProxyTransformer::new(key, video_base, route_base).with_fallback(fallback))
        };

        let body = rewrite_playlist(&text, transformer.as_ref()).await?;

        Ok(GatewayResponse::Playlist {
            body,
            max_age_secs: self.settings.playlist_max_age_secs,
        })
    }

    async fn segment(
        &self,
        family: RouteFamily,
        key: &ObjectKey,
    ) -> Result<GatewayResponse, AppError> {
        if family == RouteFamily::UnifiedQuery
            && self.settings.segment_delivery == SegmentDelivery::Redirect
        {
            let signed = self.signer.sign(key).await?;
            return Ok(GatewayResponse::Redirect {
                location: signed.url,
            });
        }

        let segment = self.fetcher.fetch(key).await?;
        Ok(GatewayResponse::Segment {
            body: segment.body,
            content_type: segment.content_type,
            content_length: segment.content_length,
            max_age_secs: self.settings.segment_max_age_secs,
        })
    }
}
