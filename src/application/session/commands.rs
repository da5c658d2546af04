//! Messages from session handles to the session task.

use tokio::sync::oneshot;

use super::{SessionError, SessionSnapshot};
use crate::application::save_pipeline::SaveStatus;
use crate::domain::document::Activation;
use crate::domain::foundation::SectionId;
use crate::ports::{ExportFormat, ExportRequest, ExportedDocument};

pub(super) type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

#[derive(Debug)]
pub(super) enum SessionCommand {
    Edit {
        content: String,
        reply: Reply<()>,
    },
    MoveCursor {
        offset: usize,
        reply: Reply<usize>,
    },
    Activate {
        section_id: SectionId,
        reply: Reply<Activation>,
    },
    Snapshot {
        reply: Reply<SessionSnapshot>,
    },
    BuildExport {
        format: ExportFormat,
        reply: Reply<ExportRequest>,
    },
    Export {
        format: ExportFormat,
        reply: Reply<ExportedDocument>,
    },
    Suggest {
        requirements: Vec<String>,
        context: String,
        reply: Reply<String>,
    },
    Close {
        reply: Reply<SaveStatus>,
    },
}
