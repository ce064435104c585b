//! The tool/resource/prompt/root registry (§3 Tool/Resource/Prompt/Root,
//! §4.2.1 capabilities, §4.2.5 list-changed).
//!
//! Registrations are write-once at startup; after that, reading them
//! requires no lock beyond `DashMap`'s own sharding (§5 Shared resources).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;

use mcpkit_core::Session;
use mcpkit_protocol::capabilities::{
    PromptsCapabilities, ResourcesCapabilities, RootsCapabilities, SamplingCapabilities, ServerCapabilities,
    ToolsCapabilities,
};
use mcpkit_protocol::{McpError, Result};
use mcpkit_types::{Prompt, PromptResult, Resource, Root, Tool};

use crate::content::HandlerOutput;

/// A tool handler: arguments (already schema-validated) and the calling
/// session, returning a value the dispatcher converts to content (§4.9).
pub type ToolHandler = Arc<dyn Fn(Value, Arc<Session>) -> BoxFuture<'static, Result<HandlerOutput>> + Send + Sync>;

/// A resource handler: the calling session, returning raw content.
pub type ResourceHandler = Arc<dyn Fn(Arc<Session>) -> BoxFuture<'static, Result<HandlerOutput>> + Send + Sync>;

/// A prompt handler: resolved arguments and the calling session, returning
/// the structural `{messages, description?}` shape directly (§4.2.4).
pub type PromptHandler =
    Arc<dyn Fn(HashMap<String, Value>, Arc<Session>) -> BoxFuture<'static, Result<PromptResult>> + Send + Sync>;

#[derive(Clone)]
pub struct ToolEntry {
    pub tool: Tool,
    pub handler: ToolHandler,
}

#[derive(Clone)]
pub struct ResourceEntry {
    pub resource: Resource,
    pub handler: ResourceHandler,
}

#[derive(Clone)]
pub struct PromptEntry {
    pub prompt: Prompt,
    pub handler: PromptHandler,
}

/// Which entity kind a list-changed flag or capability entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Tool,
    Resource,
    Prompt,
    Root,
}

/// Holds every registered tool/resource/prompt/root plus the list-changed
/// flags that drive §4.2.5's push-notification mechanics.
pub struct Registry {
    tools: DashMap<String, ToolEntry>,
    resources: DashMap<String, Resource>,
    resource_handlers: DashMap<String, ResourceHandler>,
    prompts: DashMap<String, PromptEntry>,
    roots: DashMap<String, Root>,

    tools_list_changed: AtomicBool,
    resources_list_changed: AtomicBool,
    prompts_list_changed: AtomicBool,
    roots_list_changed: AtomicBool,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
            resources: DashMap::new(),
            resource_handlers: DashMap::new(),
            prompts: DashMap::new(),
            roots: DashMap::new(),
            tools_list_changed: AtomicBool::new(false),
            resources_list_changed: AtomicBool::new(false),
            prompts_list_changed: AtomicBool::new(false),
            roots_list_changed: AtomicBool::new(false),
        }
    }

    /// Register a tool. Idempotent failure: a duplicate name leaves the
    /// table unchanged and returns an error (§4.2 register_*).
    pub fn register_tool(&self, tool: Tool, handler: ToolHandler) -> Result<()> {
        if self.tools.contains_key(&tool.name) {
            return Err(McpError::server(format!("tool already registered: {}", tool.name))
                .with_details(serde_json::json!({"name": tool.name}))
                .into_box());
        }
        let name = tool.name.clone();
        self.tools.insert(name, ToolEntry { tool, handler });
        self.tools_list_changed.store(true, Ordering::Release);
        Ok(())
    }

    pub fn register_resource(&self, resource: Resource, handler: ResourceHandler) -> Result<()> {
        if self.resources.contains_key(&resource.uri) {
            return Err(McpError::server(format!("resource already registered: {}", resource.uri))
                .with_details(serde_json::json!({"uri": resource.uri}))
                .into_box());
        }
        let uri = resource.uri.clone();
        self.resources.insert(uri.clone(), resource);
        self.resource_handlers.insert(uri, handler);
        self.resources_list_changed.store(true, Ordering::Release);
        Ok(())
    }

    pub fn register_prompt(&self, prompt: Prompt, handler: PromptHandler) -> Result<()> {
        if self.prompts.contains_key(&prompt.name) {
            return Err(McpError::server(format!("prompt already registered: {}", prompt.name))
                .with_details(serde_json::json!({"name": prompt.name}))
                .into_box());
        }
        let name = prompt.name.clone();
        self.prompts.insert(name, PromptEntry { prompt, handler });
        self.prompts_list_changed.store(true, Ordering::Release);
        Ok(())
    }

    pub fn register_root(&self, root: Root) -> Result<()> {
        if self.roots.contains_key(&root.uri) {
            return Err(McpError::server(format!("root already registered: {}", root.uri))
                .with_details(serde_json::json!({"uri": root.uri}))
                .into_box());
        }
        let uri = root.uri.clone();
        self.roots.insert(uri, root);
        self.roots_list_changed.store(true, Ordering::Release);
        Ok(())
    }

    pub fn tool(&self, name: &str) -> Option<ToolEntry> {
        self.tools.get(name).map(|e| e.clone())
    }

    pub fn resource(&self, uri: &str) -> Option<(Resource, ResourceHandler)> {
        let resource = self.resources.get(uri)?.clone();
        let handler = self.resource_handlers.get(uri)?.clone();
        Some((resource, handler))
    }

    pub fn prompt(&self, name: &str) -> Option<PromptEntry> {
        self.prompts.get(name).map(|e| e.clone())
    }

    /// Snapshot and clear the tools list-changed flag (§4.2.5).
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools_list_changed.store(false, Ordering::Release);
        self.tools.iter().map(|e| e.tool.clone()).collect()
    }

    pub fn list_resources(&self) -> Vec<Resource> {
        self.resources_list_changed.store(false, Ordering::Release);
        self.resources.iter().map(|e| e.clone()).collect()
    }

    pub fn list_prompts(&self) -> Vec<Prompt> {
        self.prompts_list_changed.store(false, Ordering::Release);
        self.prompts.iter().map(|e| e.prompt.clone()).collect()
    }

    pub fn list_roots(&self) -> Vec<Root> {
        self.roots_list_changed.store(false, Ordering::Release);
        self.roots.iter().map(|e| e.clone()).collect()
    }

    /// Whether the flag for `kind` is currently raised, without clearing it.
    /// Used by the dispatcher to decide whether a registration should push a
    /// list-changed notification to tracked sessions.
    pub fn is_list_changed(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Tool => self.tools_list_changed.load(Ordering::Acquire),
            EntityKind::Resource => self.resources_list_changed.load(Ordering::Acquire),
            EntityKind::Prompt => self.prompts_list_changed.load(Ordering::Acquire),
            EntityKind::Root => self.roots_list_changed.load(Ordering::Acquire),
        }
    }

    /// The `capabilities` block returned from `initialize` (§4.2.1).
    ///
    /// Per the source: `tools`/`resources` report a fixed `listChanged:false`
    /// regardless of the live flag (the flag still drives the push mechanism
    /// in §4.2.5); `prompts` reflects the live flag; `roots` is fixed `true`
    /// once any root is registered.
    pub fn capabilities(&self, sampling: Option<SamplingCapabilities>) -> ServerCapabilities {
        let tools = if self.tools.is_empty() {
            None
        } else {
            Some(ToolsCapabilities { list_changed: false })
        };
        let resources = if self.resources.is_empty() {
            None
        } else {
            Some(ResourcesCapabilities { subscribe: false, list_changed: false })
        };
        let prompts = if self.prompts.is_empty() {
            None
        } else {
            Some(PromptsCapabilities {
                list_changed: self.prompts_list_changed.load(Ordering::Acquire),
            })
        };
        let roots = if self.roots.is_empty() {
            None
        } else {
            Some(RootsCapabilities { list_changed: true })
        };

        ServerCapabilities { tools, resources, prompts, roots, sampling }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn noop_tool_handler() -> ToolHandler {
        Arc::new(|_args, _session| async { Ok(HandlerOutput::Text("ok".into())) }.boxed())
    }

    #[test]
    fn duplicate_tool_registration_fails_and_leaves_table_unchanged() {
        let registry = Registry::new();
        let tool = Tool {
            name: "echo".into(),
            description: "echoes".into(),
            input_schema: serde_json::json!({"type": "object"}),
            annotations: None,
        };
        registry.register_tool(tool.clone(), noop_tool_handler()).unwrap();
        let err = registry.register_tool(tool, noop_tool_handler()).unwrap_err();
        assert_eq!(err.kind, mcpkit_protocol::ErrorKind::Server);
        assert_eq!(registry.list_tools().len(), 1);
    }

    #[test]
    fn capabilities_report_static_false_for_tools_and_resources() {
        let registry = Registry::new();
        let tool = Tool {
            name: "echo".into(),
            description: "echoes".into(),
            input_schema: serde_json::json!({"type": "object"}),
            annotations: None,
        };
        registry.register_tool(tool, noop_tool_handler()).unwrap();
        let caps = registry.capabilities(None);
        assert_eq!(caps.tools.unwrap().list_changed, false);
    }

    #[test]
    fn listing_clears_the_changed_flag() {
        let registry = Registry::new();
        let prompt = Prompt { name: "greet".into(), description: None, arguments: vec![] };
        registry
            .register_prompt(prompt, Arc::new(|_a, _s| async { unreachable!() }.boxed()))
            .unwrap();
        assert!(registry.is_list_changed(EntityKind::Prompt));
        let _ = registry.list_prompts();
        assert!(!registry.is_list_changed(EntityKind::Prompt));
    }
}
