//! Ordered version list of the loaded track.
//!
//! Version order is creation order and stays stable across reads; the
//! selected version is an index into that sequence. At most one version may
//! be flagged master.

use crate::error::{PlaybackError, Result};
use core_library::models::{TrackId, TrackVersion};

/// The version sequence of one logical track plus the current selection.
#[derive(Debug, Clone)]
pub struct VersionList {
    track_id: TrackId,
    versions: Vec<TrackVersion>,
    current_index: usize,
}

impl VersionList {
    /// Build a list from versions in creation order.
    ///
    /// Rejects empty lists, versions belonging to another track, and lists
    /// with more than one master.
    pub fn new(track_id: TrackId, versions: Vec<TrackVersion>) -> Result<Self> {
        if versions.is_empty() {
            return Err(PlaybackError::InvalidVersionList(
                "version list is empty".to_string(),
            ));
        }
        if let Some(stray) = versions.iter().find(|v| v.track_id != track_id) {
            return Err(PlaybackError::InvalidVersionList(format!(
                "version {} belongs to track {}",
                stray.id, stray.track_id
            )));
        }
        let masters = versions.iter().filter(|v| v.is_master).count();
        if masters > 1 {
            return Err(PlaybackError::InvalidVersionList(format!(
                "{masters} versions flagged master"
            )));
        }

        Ok(Self {
            track_id,
            versions,
            current_index: 0,
        })
    }

    /// Build a list with the selection placed on the master version (or the
    /// first version when no master is flagged).
    pub fn starting_at_master(track_id: TrackId, versions: Vec<TrackVersion>) -> Result<Self> {
        let mut list = Self::new(track_id, versions)?;
        if let Some(index) = list.versions.iter().position(|v| v.is_master) {
            list.current_index = index;
        }
        Ok(list)
    }

    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    /// `true` iff navigating between versions is meaningful.
    pub fn has_versions(&self) -> bool {
        self.versions.len() > 1
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> &TrackVersion {
        &self.versions[self.current_index]
    }

    pub fn get(&self, index: usize) -> Option<&TrackVersion> {
        self.versions.get(index)
    }

    /// The master version, when one is flagged.
    pub fn master(&self) -> Option<&TrackVersion> {
        self.versions.iter().find(|v| v.is_master)
    }

    /// Move the selection to `index`.
    pub fn select(&mut self, index: usize) -> Result<&TrackVersion> {
        if index >= self.versions.len() {
            return Err(PlaybackError::VersionOutOfRange {
                index,
                available: self.versions.len(),
            });
        }
        self.current_index = index;
        Ok(&self.versions[index])
    }

    /// Index after the current one, wrapping at the end.
    pub fn next_index(&self) -> usize {
        (self.current_index + 1) % self.versions.len()
    }

    /// Index before the current one, wrapping at the start.
    pub fn previous_index(&self) -> usize {
        if self.current_index == 0 {
            self.versions.len() - 1
        } else {
            self.current_index - 1
        }
    }
}
