//! Dispatch table for the chat invoke endpoints.
//!
//! The service exposes one endpoint per combination of payload shape and
//! retrieval mode. Callers describe the send with an [`InvokeRoute`] and the
//! table yields the path and the multipart field carrying the file.

use crate::core::attachment::AttachmentKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Text,
    Image,
    Document,
}

impl PayloadKind {
    pub fn for_attachment(kind: Option<AttachmentKind>) -> Self {
        match kind {
            None => PayloadKind::Text,
            Some(AttachmentKind::Image) => PayloadKind::Image,
            Some(AttachmentKind::Document) => PayloadKind::Document,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvokeRoute {
    pub kind: PayloadKind,
    pub rag: bool,
}

struct RouteEntry {
    kind: PayloadKind,
    rag: bool,
    path: &'static str,
    file_field: Option<&'static str>,
}

const ROUTES: [RouteEntry; 6] = [
    RouteEntry {
        kind: PayloadKind::Text,
        rag: false,
        path: "chat/invoke",
        file_field: None,
    },
    RouteEntry {
        kind: PayloadKind::Text,
        rag: true,
        path: "chat/invoke_rag",
        file_field: None,
    },
    RouteEntry {
        kind: PayloadKind::Image,
        rag: false,
        path: "chat/invoke_with_image",
        file_field: Some("image_file"),
    },
    RouteEntry {
        kind: PayloadKind::Image,
        rag: true,
        path: "chat/invoke_rag_with_image",
        file_field: Some("image_file"),
    },
    RouteEntry {
        kind: PayloadKind::Document,
        rag: false,
        path: "chat/invoke_with_text_file",
        file_field: Some("text_file"),
    },
    RouteEntry {
        kind: PayloadKind::Document,
        rag: true,
        path: "chat/invoke_rag_with_text_file",
        file_field: Some("text_file"),
    },
];

impl InvokeRoute {
    pub fn new(kind: PayloadKind, rag: bool) -> Self {
        Self { kind, rag }
    }

    fn entry(self) -> &'static RouteEntry {
        // Every (kind, rag) pair has exactly one row.
        ROUTES
            .iter()
            .find(|entry| entry.kind == self.kind && entry.rag == self.rag)
            .unwrap_or(&ROUTES[0])
    }

    /// Path below `/api/`.
    pub fn path(self) -> &'static str {
        self.entry().path
    }

    /// Multipart field name for the file, `None` for JSON payloads.
    pub fn file_field(self) -> Option<&'static str> {
        self.entry().file_field
    }

    pub fn is_multipart(self) -> bool {
        self.file_field().is_some()
    }
}
