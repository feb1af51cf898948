//! Capture pipeline for one camera-screen visit.
//!
//! ```text
//!   Idle --Start--> Acquiring --StreamReady(ok)--> Live --Shutter--> Frozen --Save--> Closed
//!                       |                           ^                  |
//!                       +--StreamReady(err)--> Unavailable             |
//!                                                   +-----Shutter------+   (reset)
//!   any --Return--> Closed
//!   Closed --Resume--> Acquiring   (page shown again from the back/forward cache)
//! ```
//!
//! The session owns the live stream while `Live` and the pending photo while
//! `Frozen`. Asynchronous work (stream acquisition, JPEG encoding) is started
//! through [`CaptureHost`] with a [`Ticket`]; results come back as events and
//! are dropped when their ticket is no longer current. A stale stream is
//! released on arrival, so two streams are never held at once.

use std::rc::Rc;

use tracing::{debug, error, info};

use crate::error::{CaptureError, StorageError};
use crate::model::{EncodedPhoto, NavCoords, PhotoRecord};

/// A live camera stream. `release` stops every track and must be idempotent.
pub trait CaptureStream {
    fn release(&mut self);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(pub u64);

/// Side effects requested by the session.
pub trait CaptureHost {
    type Stream: CaptureStream;

    /// Starts acquiring the rear camera; the outcome arrives as
    /// [`CaptureEvent::StreamReady`] carrying the same ticket.
    fn request_stream(&mut self, ticket: Ticket);

    /// Copies the current frame of `stream` off-screen, draws `label` onto it
    /// and starts JPEG encoding. The frame must be read before this returns;
    /// the encoded photo arrives as [`CaptureEvent::Encoded`].
    fn grab_frame(
        &mut self,
        stream: &Self::Stream,
        label: &str,
        ticket: Ticket,
    ) -> Result<(), CaptureError>;

    fn persist(&mut self, record: &PhotoRecord) -> Result<(), StorageError>;

    fn navigate_home(&mut self);
}

#[derive(Debug)]
pub enum CaptureEvent<S> {
    Start,
    StreamReady {
        ticket: Ticket,
        result: Result<S, CaptureError>,
    },
    Shutter,
    Encoded {
        ticket: Ticket,
        result: Result<EncodedPhoto, CaptureError>,
    },
    Save,
    Return,
    /// The page was hidden and is being shown again.
    Resume,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReadyPhoto {
    pub photo: EncodedPhoto,
    pub data_url: Rc<str>,
}

/// The frozen frame. Save is only possible once it is `Ready`.
#[derive(Clone, Debug, PartialEq)]
pub enum PendingPhoto {
    Encoding,
    Ready(ReadyPhoto),
    Failed(CaptureError),
}

#[derive(Debug)]
pub enum Phase<S> {
    Idle,
    Acquiring,
    Live(S),
    /// Camera could not be opened; only Return is possible.
    Unavailable(CaptureError),
    Frozen {
        pending: PendingPhoto,
        save_error: Option<CaptureError>,
    },
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutterMode {
    /// Take a photo (shown as "pause").
    Capture,
    /// Back to the live feed (shown as "play").
    Reset,
    Disabled,
}

/// Everything the camera view needs to render.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureView {
    pub shutter: ShutterMode,
    pub save_enabled: bool,
    pub show_live: bool,
    pub photo: Option<ReadyPhoto>,
    pub error: Option<String>,
}

pub struct CaptureSession<S: CaptureStream> {
    coords: NavCoords,
    phase: Phase<S>,
    ticket: Ticket,
}

impl<S: CaptureStream> CaptureSession<S> {
    pub fn new(coords: NavCoords) -> Self {
        Self {
            coords,
            phase: Phase::Idle,
            ticket: Ticket::default(),
        }
    }

    pub fn phase(&self) -> &Phase<S> {
        &self.phase
    }

    fn next_ticket(&mut self) -> Ticket {
        self.ticket = Ticket(self.ticket.0 + 1);
        self.ticket
    }

    pub fn dispatch<H>(&mut self, host: &mut H, event: CaptureEvent<S>)
    where
        H: CaptureHost<Stream = S>,
    {
        match event {
            CaptureEvent::Start => {
                if matches!(self.phase, Phase::Idle) {
                    self.enter_live(host);
                }
            }
            CaptureEvent::StreamReady { ticket, result } => self.on_stream(ticket, result),
            CaptureEvent::Shutter => match self.phase {
                Phase::Live(_) => self.freeze(host),
                Phase::Frozen { .. } => {
                    info!("discarding frozen photo, back to live view");
                    self.enter_live(host);
                }
                _ => debug!("shutter ignored outside live/frozen"),
            },
            CaptureEvent::Encoded { ticket, result } => self.on_encoded(ticket, result),
            CaptureEvent::Save => self.save(host),
            CaptureEvent::Return => {
                self.shutdown();
                host.navigate_home();
            }
            CaptureEvent::Resume => {
                if matches!(self.phase, Phase::Closed) {
                    info!("reopening camera after page restore");
                    self.enter_live(host);
                }
            }
        }
    }

    /// Releases any held stream and closes the session without navigating.
    /// Called on page teardown.
    pub fn shutdown(&mut self) {
        // Invalidate in-flight requests; late streams get released on arrival.
        self.next_ticket();
        if let Phase::Live(mut stream) = std::mem::replace(&mut self.phase, Phase::Closed) {
            stream.release();
        }
    }

    fn enter_live<H: CaptureHost<Stream = S>>(&mut self, host: &mut H) {
        if let Phase::Live(mut stream) = std::mem::replace(&mut self.phase, Phase::Acquiring) {
            stream.release();
        }
        let ticket = self.next_ticket();
        host.request_stream(ticket);
    }

    fn on_stream(&mut self, ticket: Ticket, result: Result<S, CaptureError>) {
        let current = ticket == self.ticket && matches!(self.phase, Phase::Acquiring);
        match (current, result) {
            (true, Ok(stream)) => {
                info!("camera stream live");
                self.phase = Phase::Live(stream);
            }
            (true, Err(e)) => {
                error!(error = %e, "could not open camera");
                self.phase = Phase::Unavailable(e);
            }
            (false, Ok(mut stream)) => {
                debug!(ticket = ticket.0, "releasing stale camera stream");
                stream.release();
            }
            (false, Err(e)) => debug!(ticket = ticket.0, error = %e, "stale stream failure"),
        }
    }

    fn freeze<H: CaptureHost<Stream = S>>(&mut self, host: &mut H) {
        let ticket = self.next_ticket();
        let label = self.coords.label();
        let grabbed = match &self.phase {
            Phase::Live(stream) => host.grab_frame(stream, &label, ticket),
            _ => return,
        };
        let pending = match grabbed {
            Ok(()) => PendingPhoto::Encoding,
            Err(e) => {
                error!(error = %e, "frame capture failed");
                PendingPhoto::Failed(e)
            }
        };
        let previous = std::mem::replace(
            &mut self.phase,
            Phase::Frozen {
                pending,
                save_error: None,
            },
        );
        if let Phase::Live(mut stream) = previous {
            stream.release();
        }
        info!(label = %label, "photo taken");
    }

    fn on_encoded(&mut self, ticket: Ticket, result: Result<EncodedPhoto, CaptureError>) {
        if ticket != self.ticket {
            debug!(ticket = ticket.0, "dropping stale encode result");
            return;
        }
        let Phase::Frozen { pending, .. } = &mut self.phase else {
            return;
        };
        if !matches!(pending, PendingPhoto::Encoding) {
            return;
        }
        *pending = match result {
            Ok(photo) => {
                debug!(bytes = photo.bytes.len(), "photo encoded");
                let data_url: Rc<str> = photo.to_data_url().into();
                PendingPhoto::Ready(ReadyPhoto { photo, data_url })
            }
            Err(e) => {
                error!(error = %e, "photo encoding failed");
                PendingPhoto::Failed(e)
            }
        };
    }

    fn save<H: CaptureHost<Stream = S>>(&mut self, host: &mut H) {
        let Phase::Frozen {
            pending,
            save_error,
        } = &mut self.phase
        else {
            debug!("save ignored outside frozen state");
            return;
        };
        let PendingPhoto::Ready(ready) = pending else {
            *save_error = Some(CaptureError::NotReady);
            return;
        };
        let record = PhotoRecord {
            key: self.coords.key(),
            data_url: ready.data_url.to_string(),
        };
        match host.persist(&record) {
            Ok(()) => {
                info!(key = %record.key, "photo saved");
                self.phase = Phase::Closed;
                host.navigate_home();
            }
            Err(e) => {
                error!(error = %e, "saving photo failed");
                *save_error = Some(e.into());
            }
        }
    }

    pub fn view(&self) -> CaptureView {
        match &self.phase {
            Phase::Idle | Phase::Acquiring | Phase::Closed => CaptureView {
                shutter: ShutterMode::Disabled,
                save_enabled: false,
                show_live: true,
                photo: None,
                error: None,
            },
            Phase::Live(_) => CaptureView {
                shutter: ShutterMode::Capture,
                save_enabled: false,
                show_live: true,
                photo: None,
                error: None,
            },
            Phase::Unavailable(e) => CaptureView {
                shutter: ShutterMode::Disabled,
                save_enabled: false,
                show_live: true,
                photo: None,
                error: Some(e.to_string()),
            },
            Phase::Frozen {
                pending,
                save_error,
            } => {
                let (photo, pending_error) = match pending {
                    PendingPhoto::Encoding => (None, None),
                    PendingPhoto::Ready(r) => (Some(r.clone()), None),
                    PendingPhoto::Failed(e) => (None, Some(e.to_string())),
                };
                CaptureView {
                    shutter: ShutterMode::Reset,
                    save_enabled: photo.is_some(),
                    show_live: false,
                    photo,
                    error: save_error.as_ref().map(|e| e.to_string()).or(pending_error),
                }
            }
        }
    }
}

impl<S: CaptureStream> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataurl;
    use crate::storage::{InMemoryPhotoStore, PhotoStore};
    use std::cell::Cell;
    use std::io::Cursor;

    struct FakeStream {
        live: bool,
        active: Rc<Cell<usize>>,
    }

    impl CaptureStream for FakeStream {
        fn release(&mut self) {
            if self.live {
                self.live = false;
                self.active.set(self.active.get() - 1);
            }
        }
    }

    #[derive(Default)]
    struct FakeHost {
        active: Rc<Cell<usize>>,
        requests: Vec<Ticket>,
        grabs: Vec<(String, Ticket)>,
        fail_grab: bool,
        store: InMemoryPhotoStore,
        navigated: usize,
    }

    impl FakeHost {
        fn open_stream(&self) -> FakeStream {
            self.active.set(self.active.get() + 1);
            FakeStream {
                live: true,
                active: self.active.clone(),
            }
        }
    }

    impl CaptureHost for FakeHost {
        type Stream = FakeStream;

        fn request_stream(&mut self, ticket: Ticket) {
            assert_eq!(self.active.get(), 0, "previous stream still holds the camera");
            self.requests.push(ticket);
        }

        fn grab_frame(
            &mut self,
            stream: &FakeStream,
            label: &str,
            ticket: Ticket,
        ) -> Result<(), CaptureError> {
            assert!(stream.live, "frame grabbed from a released stream");
            if self.fail_grab {
                return Err(CaptureError::NoVideoFrame);
            }
            self.grabs.push((label.to_string(), ticket));
            Ok(())
        }

        fn persist(&mut self, record: &PhotoRecord) -> Result<(), StorageError> {
            self.store.put(record)
        }

        fn navigate_home(&mut self) {
            self.navigated += 1;
        }
    }

    fn coords() -> NavCoords {
        NavCoords {
            lng: "9.744844".into(),
            lat: "47.406653".into(),
        }
    }

    fn photo(width: u32, height: u32) -> EncodedPhoto {
        EncodedPhoto {
            bytes: vec![0xff, 0xd8, 0xff, 0xd9],
            width,
            height,
        }
    }

    /// Drives a fresh session into `Live`.
    fn live_session(host: &mut FakeHost) -> CaptureSession<FakeStream> {
        let mut session = CaptureSession::new(coords());
        session.dispatch(host, CaptureEvent::Start);
        let ticket = *host.requests.last().unwrap();
        let stream = host.open_stream();
        session.dispatch(
            host,
            CaptureEvent::StreamReady {
                ticket,
                result: Ok(stream),
            },
        );
        session
    }

    fn freeze_and_encode(
        session: &mut CaptureSession<FakeStream>,
        host: &mut FakeHost,
        encoded: EncodedPhoto,
    ) {
        session.dispatch(host, CaptureEvent::Shutter);
        let ticket = host.grabs.last().unwrap().1;
        session.dispatch(
            host,
            CaptureEvent::Encoded {
                ticket,
                result: Ok(encoded),
            },
        );
    }

    #[test]
    fn live_state_arms_shutter_and_disables_save() {
        let mut host = FakeHost::default();
        let session = live_session(&mut host);
        let view = session.view();
        assert_eq!(view.shutter, ShutterMode::Capture);
        assert!(!view.save_enabled);
        assert!(view.show_live);
        assert_eq!(host.active.get(), 1);
    }

    #[test]
    fn capture_labels_frame_and_releases_stream() {
        let mut host = FakeHost::default();
        let mut session = live_session(&mut host);
        session.dispatch(&mut host, CaptureEvent::Shutter);

        assert_eq!(host.grabs[0].0, "9.744844,47.406653");
        assert_eq!(host.active.get(), 0);
        let view = session.view();
        assert_eq!(view.shutter, ShutterMode::Reset);
        assert!(!view.show_live);
        // Still encoding: save stays gated.
        assert!(!view.save_enabled);
    }

    #[test]
    fn save_is_gated_on_encoding() {
        let mut host = FakeHost::default();
        let mut session = live_session(&mut host);
        session.dispatch(&mut host, CaptureEvent::Shutter);
        session.dispatch(&mut host, CaptureEvent::Save);

        assert!(host.store.is_empty());
        assert_eq!(host.navigated, 0);
        assert_eq!(
            session.view().error.as_deref(),
            Some("photo is not ready yet")
        );

        let ticket = host.grabs[0].1;
        session.dispatch(
            &mut host,
            CaptureEvent::Encoded {
                ticket,
                result: Ok(photo(4, 3)),
            },
        );
        assert!(session.view().save_enabled);
    }

    #[test]
    fn reset_releases_before_reacquiring() {
        let mut host = FakeHost::default();
        let mut session = live_session(&mut host);
        freeze_and_encode(&mut session, &mut host, photo(4, 3));

        // Reset: FakeHost::request_stream asserts no stream is active.
        session.dispatch(&mut host, CaptureEvent::Shutter);
        assert_eq!(host.requests.len(), 2);
        assert!(session.view().photo.is_none());

        let stream = host.open_stream();
        let ticket = host.requests[1];
        session.dispatch(
            &mut host,
            CaptureEvent::StreamReady {
                ticket,
                result: Ok(stream),
            },
        );
        session.dispatch(&mut host, CaptureEvent::Shutter);
        assert_eq!(host.grabs.len(), 2);
        assert_eq!(host.active.get(), 0);
    }

    #[test]
    fn stale_encode_after_reset_is_ignored() {
        let mut host = FakeHost::default();
        let mut session = live_session(&mut host);
        session.dispatch(&mut host, CaptureEvent::Shutter);
        let first = host.grabs[0].1;

        session.dispatch(&mut host, CaptureEvent::Shutter);
        let stream = host.open_stream();
        let ticket = host.requests[1];
        session.dispatch(
            &mut host,
            CaptureEvent::StreamReady {
                ticket,
                result: Ok(stream),
            },
        );
        session.dispatch(&mut host, CaptureEvent::Shutter);
        session.dispatch(
            &mut host,
            CaptureEvent::Encoded {
                ticket: first,
                result: Ok(photo(1, 1)),
            },
        );
        assert!(!session.view().save_enabled);
    }

    #[test]
    fn saving_twice_at_same_coordinates_keeps_one_record() {
        let mut host = FakeHost::default();
        for marker in [0x01u8, 0x02] {
            let mut session = live_session(&mut host);
            let mut p = photo(4, 3);
            p.bytes.push(marker);
            freeze_and_encode(&mut session, &mut host, p);
            session.dispatch(&mut host, CaptureEvent::Save);
        }
        assert_eq!(host.store.len(), 1);
        assert_eq!(host.navigated, 2);
        let stored = host
            .store
            .get(&coords().key())
            .unwrap()
            .unwrap();
        let (_, bytes) = dataurl::decode(&stored.data_url).unwrap();
        assert_eq!(bytes.last(), Some(&0x02));
    }

    #[test]
    fn saved_photo_round_trips_to_same_dimensions() {
        let frame = image::RgbImage::from_pixel(64, 48, image::Rgb([200, 120, 40]));
        let mut jpeg = Cursor::new(Vec::new());
        frame.write_to(&mut jpeg, image::ImageFormat::Jpeg).unwrap();
        let encoded = EncodedPhoto {
            bytes: jpeg.into_inner(),
            width: 64,
            height: 48,
        };

        let mut host = FakeHost::default();
        let mut session = live_session(&mut host);
        freeze_and_encode(&mut session, &mut host, encoded);
        session.dispatch(&mut host, CaptureEvent::Save);

        let records = host.store.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key.as_str(), "9.744844,47.406653");
        let (mime, bytes) = dataurl::decode(&records[0].data_url).unwrap();
        assert_eq!(mime, "image/jpeg");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn failed_save_stays_frozen_with_error() {
        let mut host = FakeHost {
            store: InMemoryPhotoStore::with_quota(8),
            ..FakeHost::default()
        };
        let mut session = live_session(&mut host);
        freeze_and_encode(&mut session, &mut host, photo(4, 3));
        session.dispatch(&mut host, CaptureEvent::Save);

        assert_eq!(host.navigated, 0);
        let view = session.view();
        assert!(view.save_enabled);
        assert!(view.error.unwrap().contains("QuotaExceededError"));
        assert!(matches!(session.phase(), Phase::Frozen { .. }));
    }

    #[test]
    fn return_from_live_releases_stream() {
        let mut host = FakeHost::default();
        let mut session = live_session(&mut host);
        session.dispatch(&mut host, CaptureEvent::Return);
        assert_eq!(host.active.get(), 0);
        assert_eq!(host.navigated, 1);
        assert!(host.store.is_empty());
        assert!(matches!(session.phase(), Phase::Closed));
    }

    #[test]
    fn stream_arriving_after_return_is_released() {
        let mut host = FakeHost::default();
        let mut session: CaptureSession<FakeStream> = CaptureSession::new(coords());
        session.dispatch(&mut host, CaptureEvent::Start);
        let ticket = host.requests[0];
        session.dispatch(&mut host, CaptureEvent::Return);

        let late = host.open_stream();
        session.dispatch(
            &mut host,
            CaptureEvent::StreamReady {
                ticket,
                result: Ok(late),
            },
        );
        assert_eq!(host.active.get(), 0);
        assert!(matches!(session.phase(), Phase::Closed));
    }

    #[test]
    fn restored_page_reopens_camera() {
        let mut host = FakeHost::default();
        let mut session = live_session(&mut host);
        session.shutdown();
        assert_eq!(host.active.get(), 0);

        session.dispatch(&mut host, CaptureEvent::Resume);
        assert!(matches!(session.phase(), Phase::Acquiring));
        let ticket = *host.requests.last().unwrap();
        assert_eq!(host.requests.len(), 2);
        let stream = host.open_stream();
        session.dispatch(
            &mut host,
            CaptureEvent::StreamReady {
                ticket,
                result: Ok(stream),
            },
        );
        assert_eq!(session.view().shutter, ShutterMode::Capture);
        assert_eq!(host.active.get(), 1);
    }

    #[test]
    fn resume_is_ignored_while_live() {
        let mut host = FakeHost::default();
        let mut session = live_session(&mut host);
        session.dispatch(&mut host, CaptureEvent::Resume);
        assert_eq!(host.requests.len(), 1);
        assert!(matches!(session.phase(), Phase::Live(_)));
    }

    #[test]
    fn dropping_session_releases_stream() {
        let mut host = FakeHost::default();
        let session = live_session(&mut host);
        drop(session);
        assert_eq!(host.active.get(), 0);
    }

    #[test]
    fn camera_failure_leaves_only_return() {
        let mut host = FakeHost::default();
        let mut session: CaptureSession<FakeStream> = CaptureSession::new(coords());
        session.dispatch(&mut host, CaptureEvent::Start);
        let ticket = host.requests[0];
        session.dispatch(
            &mut host,
            CaptureEvent::StreamReady {
                ticket,
                result: Err(CaptureError::CameraUnavailable("NotAllowedError".into())),
            },
        );
        let view = session.view();
        assert_eq!(view.shutter, ShutterMode::Disabled);
        assert!(view.error.unwrap().contains("NotAllowedError"));

        session.dispatch(&mut host, CaptureEvent::Shutter);
        assert_eq!(host.requests.len(), 1);
        session.dispatch(&mut host, CaptureEvent::Return);
        assert_eq!(host.navigated, 1);
    }

    #[test]
    fn failed_grab_still_releases_and_blocks_save() {
        let mut host = FakeHost {
            fail_grab: true,
            ..FakeHost::default()
        };
        let mut session = live_session(&mut host);
        session.dispatch(&mut host, CaptureEvent::Shutter);
        assert_eq!(host.active.get(), 0);
        let view = session.view();
        assert!(!view.save_enabled);
        assert!(view.error.is_some());
        assert_eq!(view.shutter, ShutterMode::Reset);
    }
}
