//! CEL function signature catalog and language server.
//!
//! The [`types`] module holds the signature model: parameter descriptors, the
//! fluent [`SignatureBuilder`], immutable [`FunctionSignature`] values, and
//! the [`FunctionCatalog`] registry. The language server on top offers hover
//! documentation and completion for every function in the catalog.

use std::sync::{Arc, OnceLock};

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService};
use tracing::{debug, info};

mod document;
mod lsp;
pub mod settings;
pub mod types;

pub use document::{DocumentState, DocumentStore, LineIndex};
pub use lsp::{completion_at_position, format_overload_docs, hover_at_position};
pub use settings::{build_catalog, discover_settings, load_settings};
pub use types::{
    ArgumentSyntax, Extension, FixedParameter, FunctionCatalog, FunctionFlags, FunctionSignature,
    InvariantValidator, LiteralValue, ReturnTypeRule, SemanticType, SignatureBuilder,
    SignatureError, SignatureValidator, ValidationPolicy, VariableParameter,
};

pub struct Backend {
    client: Client,
    documents: DocumentStore,
    catalog: OnceLock<Arc<FunctionCatalog>>,
}

impl Backend {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            documents: DocumentStore::new(),
            catalog: OnceLock::new(),
        }
    }

    /// The catalog configured in `initialize`, or the plain standard library
    /// if the client never sent one.
    fn catalog(&self) -> &Arc<FunctionCatalog> {
        self.catalog.get_or_init(|| Arc::new(FunctionCatalog::with_builtins()))
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        // Extract workspace root from params
        let workspace_root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|f| f.uri.to_file_path().ok())
            .or_else(|| {
                #[allow(deprecated)]
                params.root_uri.as_ref()?.to_file_path().ok()
            });

        let catalog = match workspace_root {
            Some(root) => {
                let (settings, settings_dir) = settings::discover_settings(&root);
                debug!(dir = %settings_dir.display(), "using settings");
                settings::build_catalog(&settings)
            }
            None => FunctionCatalog::with_builtins(),
        };
        info!(functions = catalog.len(), "catalog initialized");
        let _ = self.catalog.set(Arc::new(catalog));

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string()]),
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "CEL signature server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.documents.open(params.text_document.uri, params.text_document.text);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // We use FULL sync, so there's exactly one change with the full text
        if let Some(change) = params.content_changes.into_iter().next() {
            self.documents.open(params.text_document.uri, change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.close(&params.text_document.uri);
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let Some(doc) = self.documents.get(uri) else {
            return Ok(None);
        };

        Ok(lsp::hover_at_position(&doc.line_index, self.catalog(), position))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let Some(doc) = self.documents.get(uri) else {
            debug!(%uri, "completion requested for unknown document");
            return Ok(None);
        };

        Ok(lsp::completion_at_position(&doc.line_index, self.catalog(), position))
    }
}

pub fn create_service() -> (LspService<Backend>, tower_lsp::ClientSocket) {
    LspService::new(Backend::new)
}
