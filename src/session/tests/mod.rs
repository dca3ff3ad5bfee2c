//! Tests for the session state machine.
//!
//! All network traffic goes to [`mock::MockBackend`], which can fail on
//! demand or hold a request open to exercise busy gating and stale
//! responses.

mod mock;

use super::{Session, SessionOptions};
use mock::{MockBackend, png_file};

/// A session on a 100x100 image with the backend session already started.
async fn active_session(options: SessionOptions) -> Session<MockBackend> {
    let session = Session::new(MockBackend::new(), options);
    session.load_image(png_file(100, 100)).unwrap();
    session.start_session().await.unwrap();
    session
}
