// ABOUTME: Sliding-window scan rate limiter over the persisted attempt log
// ABOUTME: Quota is consumed on pipeline completion; recording is a race-free compare-and-increment
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Mealguard contributors

//! # Scan Rate Limiting
//!
//! Quota is a sliding window over the persisted `scan_attempts` log, not a
//! calendar bucket: at most `max_scans` attempts in the last
//! `window_minutes`. Because the log is a persisted sequence rather than an
//! in-process counter, the limit survives restarts and scales across
//! processes sharing the store.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config::ScanLimits;
use crate::database::Database;

/// Rate-limit decision for one user at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Whether another scan may proceed
    pub is_allowed: bool,
    /// Scans left in the current window
    pub scans_remaining: u32,
    /// When the oldest in-window attempt expires; set only when blocked
    pub reset_at: Option<DateTime<Utc>>,
}

/// Sliding-window limiter over the scan-attempt log.
#[derive(Clone)]
pub struct ScanRateLimiter {
    db: Database,
    limits: ScanLimits,
}

impl ScanRateLimiter {
    /// Create a limiter with the given limits.
    #[must_use]
    pub const fn new(db: Database, limits: ScanLimits) -> Self {
        Self { db, limits }
    }

    fn window(&self) -> Duration {
        Duration::minutes(self.limits.window_minutes)
    }

    /// Check a user's quota without consuming it.
    ///
    /// # Errors
    ///
    /// Returns an error when the store is unavailable.
    pub async fn check(&self, user_id: Uuid) -> anyhow::Result<RateLimitStatus> {
        let now = Utc::now();
        let window_start = now - self.window();

        let recent = self.db.count_recent_scans(user_id, window_start).await?;
        let recent = u32::try_from(recent).unwrap_or(u32::MAX);
        let is_allowed = recent < self.limits.max_scans;
        let scans_remaining = self.limits.max_scans.saturating_sub(recent);

        let reset_at = if is_allowed {
            None
        } else {
            self.db
                .oldest_recent_scan(user_id, window_start)
                .await?
                .map(|oldest| oldest + self.window())
        };

        Ok(RateLimitStatus {
            is_allowed,
            scans_remaining,
            reset_at,
        })
    }

    /// Consume one quota slot for a completed scan.
    ///
    /// Returns `false` when the window filled up between the advisory check
    /// and completion; the attempt is not recorded in that case.
    ///
    /// # Errors
    ///
    /// Returns an error when the store is unavailable.
    pub async fn record(&self, user_id: Uuid, origin_ip: Option<&str>) -> anyhow::Result<bool> {
        let now = Utc::now();
        self.db
            .try_record_scan(
                user_id,
                origin_ip,
                now,
                now - self.window(),
                self.limits.max_scans,
            )
            .await
    }

    /// Retention sweep over the attempt log. Returns removed row count.
    ///
    /// # Errors
    ///
    /// Returns an error when the store is unavailable.
    pub async fn purge_expired(&self) -> anyhow::Result<u64> {
        let cutoff = Utc::now() - Duration::days(self.limits.retention_days);
        self.db.purge_scan_attempts(cutoff).await
    }
}
