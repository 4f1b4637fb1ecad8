use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use dashmap::DashMap;
use anyhow::Result;
use tracing::{debug, info};

use crate::compiler::core::Compiler;
use crate::compiler::loader;
use crate::dsl::{NodeType, ProcessDefinition};
use crate::error::EngineError;
use crate::runtime::action::{
    Action, CascadeAction, CompleteAction, ContinueAction, DequeueAction, EventAction, IncidentAction,
    QueueAction, ResumeAction,
};
use crate::runtime::environment::{Environment, NodeTable};
use crate::runtime::event::{DefaultEventEmitter, Event, EventEmitter, EventRegistry, InMemoryEventRegistry};
use crate::runtime::listener::{IncidentHandler, Listener, LoggingIncidentHandler};
use crate::runtime::node::{IdentityInterceptor, Node, NodeInterceptor};
use crate::runtime::refs::{NodeRef, ProcessRef};
use crate::runtime::state::{Properties, State};
use crate::runtime::storage::{InMemoryProcessStore, ProcessStore};
use crate::services::{Service, ServiceRegistry};

type ActionFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<State>>> + Send + 'a>>;

/// Single-threaded, recursive action interpreter.
///
/// Every action is awaited to completion before the next one starts, and the
/// states each action produces are concatenated left to right. Nothing is
/// spawned.
pub struct SequentialBpmnEngine {
    store: Arc<dyn ProcessStore>,
    registry: Arc<dyn EventRegistry>,
    emitter: Arc<dyn EventEmitter>,
    incident_handler: Arc<dyn IncidentHandler>,
    listeners: Vec<Arc<dyn Listener>>,
    interceptor: Arc<dyn NodeInterceptor>,
    services: Arc<ServiceRegistry>,

    // Compiled node tables (JIT cache), invalidated on deploy
    executable_cache: DashMap<ProcessRef, Arc<NodeTable>>,
}

impl Default for SequentialBpmnEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialBpmnEngine {
    /// In-memory engine with the built-in services.
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn registry(&self) -> &Arc<dyn EventRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn ProcessStore> {
        &self.store
    }

    // --- Deployment ---

    /// Parse a YAML process document and deploy every process in it.
    pub async fn deploy(&self, group: &str, source: &str) -> Result<Vec<ProcessRef>> {
        let processes = loader::parse_processes(source)?;
        self.deploy_definitions(group, processes).await
    }

    pub async fn deploy_definitions(&self, group: &str, processes: Vec<ProcessDefinition>) -> Result<Vec<ProcessRef>> {
        // Validate everything before writing anything.
        let mut compiled = Vec::with_capacity(processes.len());
        for process in processes {
            let nodes = Compiler::new(&process).compile()?;
            compiled.push((process, nodes));
        }

        let mut refs = Vec::with_capacity(compiled.len());
        for (process, nodes) in compiled {
            let process_ref = ProcessRef::new(group, process.id.clone());

            for start in process.start_events() {
                let event = match &start.kind {
                    NodeType::StartEvent { trigger: Some(t) } => t.to_event(group),
                    _ => Event::none(group, process.id.clone()),
                };
                let node_ref = NodeRef::definition(group, process.id.clone(), start.id.clone());
                self.registry.create_subscription(&event, node_ref, false);
            }

            self.store.write_process(&process_ref, process).await?;
            self.executable_cache.insert(process_ref.clone(), Arc::new(nodes));
            info!(process = %process_ref, "deployed process");
            refs.push(process_ref);
        }
        Ok(refs)
    }

    async fn environment(&self, process_ref: &ProcessRef) -> Result<Environment> {
        let process = self.store.read_process(process_ref).await?;

        let nodes = match self.executable_cache.get(process_ref) {
            Some(n) => n.value().clone(),
            None => {
                let n = Arc::new(Compiler::new(&process).compile()?);
                self.executable_cache.insert(process_ref.clone(), n.clone());
                n
            }
        };

        Ok(Environment::new(process_ref.group.clone(), process, nodes, self.services.clone()))
    }

    fn lookup_node(&self, env: &Environment, node_id: &str) -> Result<Arc<dyn Node>> {
        env.get_node(node_id)
            .map(|node| self.interceptor.intercept(node))
            .ok_or_else(|| EngineError::NodeNotFound(node_id.to_string()).into())
    }

    // --- Invocation ---

    /// Start `process_ref` through its none start event and return the first resulting state.
    pub async fn invoke_by_id(&self, process_ref: &ProcessRef, init_state: Properties, header: Properties) -> Result<State> {
        let event = Event::none(process_ref.group.clone(), process_ref.process_id.clone());
        let states = self.invoke_by_event(&event, Some(init_state), Some(header)).await?;

        states
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::InvocationFailed(process_ref.clone()).into())
    }

    /// Deliver `event`: start a new instance at every subscribed start event,
    /// then resume every other subscriber.
    pub async fn invoke_by_event(
        &self,
        event: &Event,
        init_state: Option<Properties>,
        header: Option<Properties>,
    ) -> Result<Vec<State>> {
        let subscriptions = self.registry.get_subscriptions(event);
        if subscriptions.is_empty() {
            return Err(EngineError::NoSubscriptions(event.clone()).into());
        }
        debug!(%event, subscriptions = subscriptions.len(), "invoking");

        let init_state = init_state.unwrap_or_default();
        let header = header.unwrap_or_default();

        let mut results = Vec::new();
        for sub in subscriptions {
            let env = self.environment(&sub.node_ref.process_ref()).await?;
            if !env.is_start_event(&sub.node_ref.node_id) {
                continue;
            }

            let node_ref = NodeRef::fresh(env.group(), env.process_id(), sub.node_ref.node_id.clone());
            let state = State::new(init_state.clone(), node_ref, header.clone());
            let action = Action::continue_to(sub.node_ref.node_id.clone());
            results.extend(self.handle_action(action, state, &env).await?);
        }

        results.extend(self.resume_by_event(event, init_state, header, true).await?);
        Ok(results)
    }

    /// Re-enter every waiting (non start) subscriber of `event` from its persisted state.
    pub async fn resume_by_event(
        &self,
        event: &Event,
        state: Properties,
        header: Properties,
        is_reentry: bool,
    ) -> Result<Vec<State>> {
        let mut results = Vec::new();

        for sub in self.registry.get_subscriptions(event) {
            let env = self.environment(&sub.node_ref.process_ref()).await?;
            if env.is_start_event(&sub.node_ref.node_id) {
                continue;
            }

            let mut persisted = self.store.read_state(&sub.node_ref).await?;
            persisted.merge(state.clone(), header.clone());
            persisted.is_reentry = is_reentry;

            if sub.consumable {
                self.registry.delete_subscription(event, &sub.node_ref);
            }

            debug!(%event, node = %sub.node_ref, "resuming");
            results.extend(self.reenter(&sub.node_ref, persisted, &env).await?);
        }
        Ok(results)
    }

    /// Continue at the waiting visit `waiting` from its persisted `state`.
    async fn reenter(&self, waiting: &NodeRef, state: State, env: &Environment) -> Result<Vec<State>> {
        // The re-entered visit registers its own boundary events.
        self.dequeue_boundaries(waiting, &state, env).await?;

        let action = Action::continue_to(waiting.node_id.clone());
        self.handle_action(action, state, env).await
    }

    // --- Interpreter ---

    fn handle_action<'a>(&'a self, action: Action, state: State, env: &'a Environment) -> ActionFuture<'a> {
        Box::pin(async move {
            for listener in &self.listeners {
                listener.on_action(&action, &state, env);
            }

            match action {
                Action::Continue(a) => self.handle_continue(a, state, env).await,
                Action::Complete(a) => self.handle_complete(a, state, env).await,
                Action::Queue(a) => self.handle_queue(a, state).await,
                Action::Dequeue(a) => self.handle_dequeue(a, state),
                Action::Cascade(a) => self.handle_cascade(a, state, env).await,
                Action::Resume(a) => self.handle_resume(a, state).await,
                Action::Incident(a) => self.handle_incident(a),
                Action::Event(a) => self.handle_event(a, state, env).await,
            }
        })
    }

    async fn handle_continue(&self, action: ContinueAction, state: State, env: &Environment) -> Result<Vec<State>> {
        let node = self.lookup_node(env, &action.id)?;
        let node_ref = match &action.host {
            Some(host) => host.at_node(&action.id),
            None => state.node_ref.visit(&action.id),
        };
        let state = state.with_node_ref(node_ref);

        // Boundary events must be live before the host runs, even when the host is re-entered.
        for boundary in env.get_boundary_events(&action.id) {
            let enter = Action::Continue(ContinueAction::boundary(boundary.id, state.node_ref.clone()));
            let mut boundary_state = state.clone();
            boundary_state.is_reentry = false;
            self.handle_action(enter, boundary_state, env).await?;
        }

        self.execute_node(node, state, env).await
    }

    async fn execute_node(&self, node: Arc<dyn Node>, state: State, env: &Environment) -> Result<Vec<State>> {
        for listener in &self.listeners {
            listener.before_node_execution(node.as_ref(), &state);
        }
        let (state, actions) = node.execute(state, env).await?;
        for listener in &self.listeners {
            listener.after_node_execution(node.as_ref(), &state);
        }

        let mut results = Vec::new();
        for action in actions {
            results.extend(self.handle_action(action, state.clone(), env).await?);
        }
        Ok(results)
    }

    async fn handle_complete(&self, action: CompleteAction, state: State, env: &Environment) -> Result<Vec<State>> {
        let host = state.node_ref.clone();
        self.dequeue_boundaries(&host, &state, env).await?;

        if action.save_state {
            self.store.write_state(&state).await?;
        }

        if env.is_end_event(&action.id) {
            if let Some(parent) = state.parent_reference.clone() {
                let resume = Action::Resume(ResumeAction { reference: parent });
                return self.handle_action(resume, state, env).await;
            }
        }

        if action.consume_token {
            Ok(vec![state])
        } else {
            Ok(Vec::new())
        }
    }

    /// Drop the subscriptions of the boundary events attached to the visit at `host`.
    async fn dequeue_boundaries(&self, host: &NodeRef, state: &State, env: &Environment) -> Result<()> {
        for boundary in env.get_boundary_events(&host.node_id) {
            let dequeue = Action::Dequeue(DequeueAction { event: boundary.event });
            let boundary_state = state.clone().with_node_ref(host.at_node(&boundary.id));
            self.handle_action(dequeue, boundary_state, env).await?;
        }
        Ok(())
    }

    async fn handle_queue(&self, action: QueueAction, state: State) -> Result<Vec<State>> {
        if action.save_state {
            self.store.write_state(&state).await?;
        }

        match action.event {
            Some(event) => {
                self.registry.create_subscription(&event, state.node_ref.clone(), action.consumable);
                Ok(vec![state])
            }
            None => Ok(Vec::new()),
        }
    }

    fn handle_dequeue(&self, action: DequeueAction, state: State) -> Result<Vec<State>> {
        self.registry.delete_subscription(&action.event, &state.node_ref);
        Ok(Vec::new())
    }

    async fn handle_cascade(&self, action: CascadeAction, state: State, env: &Environment) -> Result<Vec<State>> {
        let start_event = Event::none(env.group(), action.process_id.clone());
        // Several start subscriptions would be ambiguous; registration order decides.
        let subscription = self
            .registry
            .get_subscriptions(&start_event)
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::NoSubscriptions(start_event.clone()))?;

        let child_env = self.environment(&subscription.node_ref.process_ref()).await?;
        let start_id = subscription.node_ref.node_id.clone();
        let child = State {
            properties: action.init_state,
            node_ref: subscription.node_ref,
            is_reentry: false,
            parent_reference: Some(action.parent_reference),
            header: state.header,
        };

        debug!(child = %action.process_id, "cascading into child process");
        let results = self.handle_action(Action::continue_to(start_id), child, &child_env).await?;
        Ok(results.into_iter().take(1).collect())
    }

    async fn handle_resume(&self, action: ResumeAction, state: State) -> Result<Vec<State>> {
        let env = self.environment(&action.reference.process_ref()).await?;
        let node = self.lookup_node(&env, &action.reference.node_id)?;

        let resumed = State {
            properties: state.properties,
            node_ref: action.reference,
            is_reentry: true,
            parent_reference: None,
            header: state.header,
        };
        self.execute_node(node, resumed, &env).await
    }

    fn handle_incident(&self, action: IncidentAction) -> Result<Vec<State>> {
        self.incident_handler.handle(&action);
        Ok(Vec::new())
    }

    async fn handle_event(&self, action: EventAction, state: State, env: &Environment) -> Result<Vec<State>> {
        let follow_ups = self.emitter.emit(&action.event, self.registry.as_ref());

        let mut results = Vec::new();
        for follow_up in follow_ups {
            let delivered = match follow_up {
                Action::Resume(resume) => self.deliver(resume, &state, env).await?,
                other => self.handle_action(other, state.clone(), env).await?,
            };
            results.extend(delivered);
        }
        Ok(results)
    }

    /// A waiting catcher resumes from its own persisted state with the
    /// thrower's properties merged in. Start events begin from the thrower's.
    async fn deliver(&self, resume: ResumeAction, thrower: &State, env: &Environment) -> Result<Vec<State>> {
        let target_env = self.environment(&resume.reference.process_ref()).await?;
        if target_env.is_start_event(&resume.reference.node_id) {
            return self.handle_action(Action::Resume(resume), thrower.clone(), env).await;
        }

        let mut persisted = self.store.read_state(&resume.reference).await?;
        persisted.merge(thrower.properties.clone(), thrower.header.clone());
        persisted.is_reentry = true;

        debug!(node = %resume.reference, "delivering event to waiting node");
        self.reenter(&resume.reference, persisted, &target_env).await
    }
}

/// Wires an engine from explicit collaborators; anything not set defaults to
/// the in-memory implementation.
pub struct EngineBuilder {
    store: Option<Arc<dyn ProcessStore>>,
    registry: Option<Arc<dyn EventRegistry>>,
    emitter: Option<Arc<dyn EventEmitter>>,
    incident_handler: Option<Arc<dyn IncidentHandler>>,
    listeners: Vec<Arc<dyn Listener>>,
    interceptor: Option<Arc<dyn NodeInterceptor>>,
    services: ServiceRegistry,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            registry: None,
            emitter: None,
            incident_handler: None,
            listeners: Vec::new(),
            interceptor: None,
            services: ServiceRegistry::with_builtins(),
        }
    }

    pub fn store(mut self, store: Arc<dyn ProcessStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn registry(mut self, registry: Arc<dyn EventRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn incident_handler(mut self, handler: Arc<dyn IncidentHandler>) -> Self {
        self.incident_handler = Some(handler);
        self
    }

    pub fn listener(mut self, listener: Arc<dyn Listener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn interceptor(mut self, interceptor: Arc<dyn NodeInterceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn service(mut self, service: Arc<dyn Service>) -> Self {
        self.services.register(service);
        self
    }

    pub fn build(self) -> SequentialBpmnEngine {
        SequentialBpmnEngine {
            store: self.store.unwrap_or_else(|| Arc::new(InMemoryProcessStore::new())),
            registry: self.registry.unwrap_or_else(|| Arc::new(InMemoryEventRegistry::new())),
            emitter: self.emitter.unwrap_or_else(|| Arc::new(DefaultEventEmitter)),
            incident_handler: self.incident_handler.unwrap_or_else(|| Arc::new(LoggingIncidentHandler)),
            listeners: self.listeners,
            interceptor: self.interceptor.unwrap_or_else(|| Arc::new(IdentityInterceptor)),
            services: Arc::new(self.services),
            executable_cache: DashMap::new(),
        }
    }
}
