//! Playlist rewriting
//!
//! An M3U8 playlist is a sequence of lines. Lines starting with `#` (tags and
//! comments) and blank lines are copied byte for byte; every other line is a
//! reference to a sub-playlist or segment and goes through a `LineTransformer`.
//! Line order and line terminators (`\n` or `\r\n`) are preserved.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use streamgate_core::constants::VARIANT_PLAYLIST_NAME;
use streamgate_core::{AppError, ObjectKey};

use crate::keys::join_reference;
use crate::signer::Signer;

/// Characters escaped inside one URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Characters escaped inside one query-string value.
const QUERY_VALUE: &AsciiSet = &PATH_SEGMENT.add(b'&').add(b'+').add(b'=');

/// Percent-encode `value` for use as a single URL path segment.
pub fn encode_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Rewrites one reference line of a playlist.
#[async_trait]
pub trait LineTransformer: Send + Sync {
    /// `reference` is the trimmed line content, without its terminator.
    async fn transform(&self, reference: &str) -> Result<String, AppError>;
}

/// Rewrite every reference line of `playlist`.
///
/// Fails as a whole if any line fails; a partially rewritten playlist is never
/// returned.
pub async fn rewrite_playlist<T>(playlist: &str, transformer: &T) -> Result<String, AppError>
where
    T: LineTransformer + ?Sized,
{
    let mut out = String::with_capacity(playlist.len() + playlist.len() / 2);

    for raw in playlist.split_inclusive('\n') {
        let (content, terminator) = split_terminator(raw);
        let trimmed = content.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            out.push_str(raw);
            continue;
        }

        out.push_str(&transformer.transform(trimmed).await?);
        out.push_str(terminator);
    }

    Ok(out)
}

fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}

fn is_absolute_url(reference: &str) -> bool {
    let lower = reference.get(..8).unwrap_or(reference).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn is_playlist_path(relative: &str) -> bool {
    relative.to_ascii_lowercase().ends_with(".m3u8")
}

/// The quality of a `{quality}/playlist.m3u8` path relative to the video base.
fn variant_quality(relative: &str) -> Option<&str> {
    relative
        .split_once('/')
        .filter(|(quality, file)| !quality.is_empty() && *file == VARIANT_PLAYLIST_NAME)
        .map(|(quality, _)| quality)
}

fn unroutable_playlist(reference: &str) -> AppError {
    AppError::invalid_segment_path(format!(
        "playlist reference '{}' is not a {{quality}}/{} variant",
        reference, VARIANT_PLAYLIST_NAME
    ))
}

/// Resolve `reference` against the playlist directory and make sure it stays
/// inside the video's tree.
fn resolve_reference(
    playlist_dir: &str,
    video_base: &str,
    reference: &str,
) -> Result<ObjectKey, AppError> {
    let key = join_reference(playlist_dir, reference)
        .filter(|key| key.starts_with(video_base) && key.len() > video_base.len())
        .ok_or_else(|| {
            AppError::invalid_segment_path(format!(
                "playlist reference '{}' escapes the video directory",
                reference
            ))
        })?;
    ObjectKey::new(key)
}

/// Replaces each reference with a presigned object-store URL.
///
/// With a variant route set, variant playlist references become
/// `{variant_route}?resolution={quality}` instead, so the player fetches the
/// variant back through the gateway and gets its segments signed in turn.
pub struct SignedUrlTransformer {
    signer: Signer,
    playlist_dir: String,
    video_base: String,
    variant_route: Option<String>,
}

impl SignedUrlTransformer {
    /// `playlist_key` is the key of the playlist being rewritten; `video_base` the
    /// directory no reference may leave.
    pub fn new(signer: Signer, playlist_key: &ObjectKey, video_base: impl Into<String>) -> Self {
        Self {
            signer,
            playlist_dir: playlist_key.dirname().to_string(),
            video_base: video_base.into(),
            variant_route: None,
        }
    }

    pub fn with_variant_route(mut self, variant_route: impl Into<String>) -> Self {
        self.variant_route = Some(variant_route.into());
        self
    }
}

#[async_trait]
impl LineTransformer for SignedUrlTransformer {
    async fn transform(&self, reference: &str) -> Result<String, AppError> {
        if is_absolute_url(reference) {
            return Ok(reference.to_string());
        }
        let key = resolve_reference(&self.playlist_dir, &self.video_base, reference)?;

        if let Some(route) = &self.variant_route {
            let relative = &key.as_str()[self.video_base.len()..];
            if is_playlist_path(relative) {
                let quality =
                    variant_quality(relative).ok_or_else(|| unroutable_playlist(reference))?;
                return Ok(format!(
                    "{}?resolution={}",
                    route,
                    utf8_percent_encode(quality, QUERY_VALUE)
                ));
            }
        }

        Ok(self.signer.sign(&key).await?.url)
    }
}

/// Replaces each reference with a same-origin gateway route.
///
/// A reference resolving to `{quality}/{file}` under the video directory becomes
/// `{route_base}/{quality}/{file}`; any other depth goes through
/// `{fallback_base}/{path}` when a fallback route exists. Playlist references
/// must be `{quality}/playlist.m3u8`, since the fallback route only serves
/// segments.
pub struct ProxyTransformer {
    playlist_dir: String,
    video_base: String,
    route_base: String,
    fallback_base: Option<String>,
}

impl ProxyTransformer {
    pub fn new(
        playlist_key: &ObjectKey,
        video_base: impl Into<String>,
        route_base: impl Into<String>,
    ) -> Self {
        Self {
            playlist_dir: playlist_key.dirname().to_string(),
            video_base: video_base.into(),
            route_base: route_base.into(),
            fallback_base: None,
        }
    }

    pub fn with_fallback(mut self, fallback_base: impl Into<String>) -> Self {
        self.fallback_base = Some(fallback_base.into());
        self
    }

    fn encode_path(path: &str) -> String {
        path.split('/')
            .map(encode_path_segment)
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[async_trait]
impl LineTransformer for ProxyTransformer {
    async fn transform(&self, reference: &str) -> Result<String, AppError> {
        if is_absolute_url(reference) {
            return Ok(reference.to_string());
        }
        let key = resolve_reference(&self.playlist_dir, &self.video_base, reference)?;
        let relative = &key.as_str()[self.video_base.len()..];

        if is_playlist_path(relative) && variant_quality(relative).is_none() {
            return Err(unroutable_playlist(reference));
        }

        if relative.matches('/').count() == 1 {
            return Ok(format!("{}/{}", self.route_base, Self::encode_path(relative)));
        }

        match &self.fallback_base {
            Some(fallback) => Ok(format!("{}/{}", fallback, Self::encode_path(relative))),
            None => Err(AppError::invalid_segment_path(format!(
                "playlist reference '{}' has no proxy route",
                reference
            ))),
        }
    }
}
