// Adapters layer: HTTP implementations of the domain ports.

pub mod lastfm;
pub mod listenbrainz;

pub use lastfm::LastfmFetcher;
pub use listenbrainz::ListenBrainzSubmitter;
