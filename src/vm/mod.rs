//! This module contains the symbolic virtual machine that explores the paths
//! of a program under analysis.

pub mod registry;
pub mod state;
pub mod thread;
pub mod value;

use std::collections::VecDeque;

use serde::Deserialize;
use tracing::{debug, trace, warn};

use crate::{
    constant::{
        DEFAULT_BUILT_IN_MEMBERS,
        DEFAULT_FORK_ON_SYMBOLIC_READS,
        DEFAULT_MAXIMUM_FORK_DEPTH,
        DEFAULT_MAXIMUM_PATHS,
        DEFAULT_PROTOTYPE_PIVOTS,
        DEFAULT_SENSITIVE_NAMES,
    },
    error::{
        self,
        container::Locatable,
        execution::{Budget, Error, Errors, LocatedError, Result},
    },
    program::{Instruction, Operand, Program},
    vm::{
        registry::Registry,
        state::{constraint::KeyResolution, heap::ObjectHandle, PathId, PathState},
        thread::VMThread,
        value::{known::KnownData, BoxedVal, Provenance, SymbolicValue},
    },
    watchdog::DynWatchdog,
};

/// The virtual machine used to perform symbolic execution of a program.
///
/// Execution is a breadth-first walk over a queue of threads, one per live
/// path. Operations act only on the state of the thread at the front of the
/// queue, and forking pushes new threads onto the back.
#[derive(Clone, Debug)]
pub struct VM {
    /// The operations that are being executed by this virtual machine.
    operations: Vec<Instruction>,

    /// The names that the virtual machine treats specially.
    registry: Registry,

    /// The queue of execution threads that will be taken when executing the
    /// provided `operations`.
    thread_queue: VecDeque<VMThread>,

    /// The stored states that are no longer associated with a thread of
    /// execution.
    stored_states: Vec<PathState>,

    /// The configuration of the virtual machine.
    config: Config,

    /// Whether the currently executing thread needs to die.
    current_thread_killed: bool,

    /// Any errors that were encountered during the course of execution.
    errors: Errors,

    /// The number of path states created so far, including the initial one.
    paths_created: usize,

    /// A watchdog that gets polled at intervals to check whether the analysis
    /// needs to exit.
    watchdog: DynWatchdog,
}

impl VM {
    /// Constructs a new virtual machine that executes `program`.
    ///
    /// It is created with an initial thread of execution that begins at the
    /// first operation, holding the program's initial objects.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the program's initial objects are malformed.
    ///
    /// # Panics
    ///
    /// Panics if the length of the operation sequence exceeds [`u32::MAX`].
    /// This is a programmer bug.
    pub fn new(
        program: &Program,
        config: Config,
        watchdog: DynWatchdog,
    ) -> error::program::Result<Self> {
        let operations = program.operations().to_vec();
        assert!(
            u32::try_from(operations.len()).is_ok(),
            "Operation count should not exceed {}",
            u32::MAX
        );
        let registry = Registry::new(&config);
        let initial_state = program.initial_state()?;

        // A program with no operations is complete before it starts.
        let mut thread_queue = VecDeque::new();
        let mut stored_states = Vec::new();
        if operations.is_empty() {
            stored_states.push(initial_state);
        } else {
            thread_queue.push_back(VMThread::new(initial_state, 0));
        }

        let current_thread_killed = false;
        let errors = Errors::default();
        let paths_created = 1;

        Ok(Self {
            operations,
            registry,
            thread_queue,
            stored_states,
            config,
            current_thread_killed,
            errors,
            paths_created,
            watchdog,
        })
    }

    /// Performs symbolic execution of the entire program along every path.
    ///
    /// Paths that fail with a non-fatal error are abandoned, with the error
    /// recorded both on the path and in the virtual machine's error buffer,
    /// and the remaining paths continue.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] as soon as a fatal error occurs, such as exceeding the
    /// exploration budget or being stopped by the watchdog. The returned
    /// container holds every error encountered up to that point, with the
    /// fatal one last.
    ///
    /// Note that if this errors, it will still be possible to collect any
    /// stored state information for as far as execution proceeded.
    pub fn execute(&mut self) -> std::result::Result<(), Errors> {
        let poll_interval = self.watchdog.poll_every().max(1);
        let mut counter = 0;

        while let Some(instruction) = self.current_instruction() {
            let instruction_pointer = self.instruction_pointer()?;

            // If we have been told to stop, stop and return an error.
            if counter % poll_interval == 0 && self.watchdog.should_stop() {
                return Err(self.fail(Error::StoppedByWatchdog.locate(instruction_pointer)));
            }

            let operation = instruction.operation();
            trace!(
                path = %self.state()?.id(),
                location = instruction_pointer,
                operation = %operation.as_text_code(),
                "executing operation"
            );

            if let Err(error) = operation.execute(self) {
                if error.payload.is_fatal() {
                    return Err(self.fail(error));
                }
                self.abandon_current_thread(error)?;
            }

            // This should never be called if there is nothing to advance to, so if it
            // errors we forward it immediately.
            self.advance()?;

            counter += 1;
        }

        Ok(())
    }

    /// Gets the operation indicated by the current instruction pointer, or
    /// [`None`] if there are no threads left to execute.
    #[must_use]
    pub fn current_instruction(&self) -> Option<Instruction> {
        let thread = self.thread_queue.front()?;
        self.operations
            .get(thread.instruction_pointer() as usize)
            .cloned()
    }

    /// Advances the virtual machine to the next operation.
    ///
    /// If the current thread has been killed or has reached the end of the
    /// program, it is removed from the queue and its state is stored.
    ///
    /// # Errors
    ///
    /// If the virtual machine cannot be advanced because there is no current
    /// thread.
    pub fn advance(&mut self) -> Result<()> {
        let operations_len = self.operations_len();
        let should_die = self.current_thread_killed;
        let current_thread = self
            .thread_queue
            .front_mut()
            .ok_or(Error::InvalidStep.locate(operations_len))?;
        let next_offset = current_thread.instruction_pointer() + 1;

        if should_die || next_offset >= operations_len {
            // In this case we are at the end of this thread, so we need to collect it and
            // move on by removing it from the queue.
            if let Some(thread) = self.thread_queue.pop_front() {
                self.store_state(thread.into());
            }

            // The thread no longer is the current, so whether is was or wasn't killed the
            // next one certainly isn't.
            self.current_thread_killed = false;
        } else {
            current_thread.step();
        }

        Ok(())
    }

    /// Evaluates `operand` on the current path.
    ///
    /// Bindings are looked up in the current path state, while literals are
    /// converted into concrete values located at the current operation.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no current thread or if a binding is not
    /// bound on the current path.
    pub fn evaluate(&self, operand: &Operand) -> Result<BoxedVal> {
        let location = self.instruction_pointer()?;
        match operand {
            Operand::Binding(name) => self.state()?.lookup(name, location).cloned(),
            Operand::Literal(literal) => Ok(SymbolicValue::known(
                location,
                literal.to_known(),
                Provenance::Literal,
            )),
        }
    }

    /// Evaluates `operand` on the current path, requiring it to be an object
    /// reference for use with `operation`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `operand` cannot be evaluated, or if it is not an
    /// object reference.
    pub fn evaluate_object(&self, operand: &Operand, operation: &str) -> Result<ObjectHandle> {
        let location = self.instruction_pointer()?;
        let value = self.evaluate(operand)?;
        value
            .as_known()
            .and_then(KnownData::as_object)
            .ok_or_else(|| Error::invalid_kind(operation, value.kind_name()).locate(location))
    }

    /// Evaluates `operand` on the current path for use as a property key.
    ///
    /// Object references are converted to strings through their `toString`
    /// member, as a computed key would be. A key that does not depend on
    /// attacker-controlled input is never [`PropertyKey::Symbolic`], even when
    /// its string form is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `operand` cannot be evaluated or converted.
    pub fn evaluate_key(&self, operand: &Operand) -> Result<PropertyKey> {
        let location = self.instruction_pointer()?;
        let mut value = self.evaluate(operand)?;
        if matches!(value.as_known(), Some(KnownData::Object(_))) {
            value = self
                .state()?
                .heap()
                .stringify(&self.registry, value, location)?;
        }

        Ok(match value.as_property_key() {
            Some(name) => PropertyKey::Name(name),
            None if value.is_symbolic() => PropertyKey::Symbolic(value),
            None => PropertyKey::Opaque(value),
        })
    }

    /// Applies `apply` to the current path for every concrete name that the
    /// symbolic `key` may equal, forking the path as necessary.
    ///
    /// - If the path's constraints already fix `key` to a name, `apply` runs
    ///   once on the current path with that name.
    /// - If `key` is known to differ from every sensitive name, `apply` runs
    ///   once on the current path with [`KeyChoice::Unresolved`].
    /// - Otherwise a new path is forked for each sensitive name that `key` may
    ///   still equal, constrained to `key == name`, and the current path
    ///   continues as the branch where `key` differs from all of them.
    ///
    /// A forked path on which `apply` fails with a non-fatal error is
    /// abandoned without affecting its siblings.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if forking would exceed the exploration budget, or if
    /// `apply` fails on the current path.
    pub fn fork_on_key<F>(&mut self, key: &BoxedVal, apply: F) -> Result<()>
    where
        F: Fn(&Registry, &mut PathState, KeyChoice<'_>) -> Result<()>,
    {
        let location = self.instruction_pointer()?;
        let resolution = self
            .state()?
            .constraints()
            .resolve(key, self.registry.sensitive_names());

        let names = match resolution {
            KeyResolution::Resolved(name) => {
                let (registry, state) = self.split_state_mut()?;
                return apply(registry, state, KeyChoice::Name(&name));
            }
            KeyResolution::Open(names) if names.is_empty() => {
                let (registry, state) = self.split_state_mut()?;
                return apply(registry, state, KeyChoice::Unresolved);
            }
            KeyResolution::Open(names) => names,
        };

        self.check_budget(names.len(), location)?;
        debug!(
            path = %self.state()?.id(),
            location,
            key = %key,
            branches = names.len() + 1,
            "forking on symbolic key"
        );

        for name in &names {
            let mut child = self.spawn_child()?;
            let state = child.state_mut();
            state.constraints_mut().assume_equal(key.clone(), name.as_str());
            state.deepen();

            match apply(&self.registry, state, KeyChoice::Name(name)) {
                Ok(()) => self.enqueue_forked_thread(child),
                Err(error) if error.payload.is_fatal() => return Err(error),
                Err(error) => self.abandon_thread(child, error),
            }
        }

        let (registry, state) = self.split_state_mut()?;
        for name in names {
            state.constraints_mut().assume_not_equal(key.clone(), name);
        }
        state.deepen();
        apply(registry, state, KeyChoice::Unresolved)
    }

    /// Gets the virtual machine state for the thread that is currently being
    /// executed.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no current thread.
    pub fn state(&self) -> Result<&PathState> {
        self.current_thread().map(VMThread::state)
    }

    /// Gets the virtual machine state for the thread that is currently being
    /// executed.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no current thread.
    pub fn state_mut(&mut self) -> Result<&mut PathState> {
        self.current_thread_mut().map(VMThread::state_mut)
    }

    /// Gets the name registry alongside the state of the current thread, for
    /// operations that need to consult one while modifying the other.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no current thread.
    pub fn split_state_mut(&mut self) -> Result<(&Registry, &mut PathState)> {
        let offset = self.operations_len();
        let thread = self
            .thread_queue
            .front_mut()
            .ok_or(Error::NoSuchThread.locate(offset))?;
        Ok((&self.registry, thread.state_mut()))
    }

    /// Gets the current value of the instruction pointer for the thread that is
    /// being executed.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no current thread.
    pub fn instruction_pointer(&self) -> Result<u32> {
        self.current_thread().map(VMThread::instruction_pointer)
    }

    /// Gets the currently executing virtual machine thread.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no current thread.
    pub fn current_thread(&self) -> Result<&VMThread> {
        self.thread_queue
            .front()
            .ok_or(Error::NoSuchThread.locate(self.operations_len()))
    }

    /// Gets the currently executing virtual machine thread.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if there is no current thread.
    pub fn current_thread_mut(&mut self) -> Result<&mut VMThread> {
        let offset = self.operations_len();
        self.thread_queue
            .front_mut()
            .ok_or(Error::NoSuchThread.locate(offset))
    }

    /// Checks if the current thread has been killed.
    #[must_use]
    pub fn current_thread_killed(&self) -> bool {
        self.current_thread_killed
    }

    /// Gets the count of remaining threads of execution for this virtual
    /// machine.
    #[must_use]
    pub fn remaining_thread_count(&self) -> usize {
        self.thread_queue.len()
    }

    /// Checks if the virtual machine has any more code to execute.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.remaining_thread_count() == 0
    }

    /// Gets the number of path states created so far, including the initial
    /// one.
    #[must_use]
    pub fn paths_created(&self) -> usize {
        self.paths_created
    }

    /// Gets the stored states that have resulted from execution in this virtual
    /// machine.
    #[must_use]
    pub fn stored_states(&self) -> &[PathState] {
        self.stored_states.as_slice()
    }

    /// Gets the name registry in use by this virtual machine.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Gets a reference to the virtual machine's configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gets a reference to the virtual machine's watchdog instance.
    #[must_use]
    pub fn watchdog(&self) -> &DynWatchdog {
        &self.watchdog
    }

    /// Consumes the virtual machine to convert it into the data necessary for
    /// judging the outcome of the analysis.
    #[must_use]
    pub fn consume(self) -> ExecutionResult {
        let mut states = self.stored_states;
        states.sort_by_key(PathState::id);
        ExecutionResult {
            states,
            errors: self.errors,
        }
    }

    /// Gets the length of the operation sequence.
    ///
    /// # Panics
    ///
    /// Panics if the operation count exceeds [`u32::MAX`] as this a programmer
    /// error.
    #[must_use]
    fn operations_len(&self) -> u32 {
        self.operations
            .len()
            .try_into()
            .unwrap_or_else(|_| panic!("Operation count should not exceed {}", u32::MAX))
    }

    /// Checks that forking `new_paths` new paths from the current thread stays
    /// within the exploration budget.
    fn check_budget(&self, new_paths: usize, location: u32) -> Result<()> {
        if self.paths_created + new_paths > self.config.maximum_paths {
            return Err(Error::BudgetExceeded {
                budget: Budget::Paths,
                limit:  self.config.maximum_paths,
            }
            .locate(location));
        }

        if self.state()?.fork_depth() + 1 > self.config.maximum_fork_depth {
            return Err(Error::BudgetExceeded {
                budget: Budget::ForkDepth,
                limit:  self.config.maximum_fork_depth,
            }
            .locate(location));
        }

        Ok(())
    }

    /// Forks the current thread into a new thread with a fresh path
    /// identifier.
    ///
    /// The new thread still points at the current operation.
    fn spawn_child(&mut self) -> Result<VMThread> {
        let id = PathId(self.paths_created);
        let child = self.current_thread()?.fork(id);
        self.paths_created += 1;
        Ok(child)
    }

    /// Moves a thread forked during the current operation on to the next
    /// operation and adds it to the queue, or stores it if the program has
    /// ended.
    fn enqueue_forked_thread(&mut self, mut thread: VMThread) {
        thread.step();
        if thread.instruction_pointer() >= self.operations_len() {
            self.store_state(thread.into());
        } else {
            self.thread_queue.push_back(thread);
        }
    }

    /// Stores the state of a thread that has finished executing.
    fn store_state(&mut self, state: PathState) {
        debug!(
            path = %state.id(),
            constraints = state.constraints().len(),
            assertions = state.outcomes().len(),
            abandoned = state.abandoned().is_some(),
            "path completed"
        );
        self.stored_states.push(state);
    }

    /// Abandons a thread that is not in the queue because of `error`, storing
    /// its state.
    fn abandon_thread(&mut self, mut thread: VMThread, error: LocatedError) {
        warn!(path = %thread.state().id(), %error, "abandoning path");
        thread.state_mut().abandon(error.clone());
        self.errors.add(error);
        self.store_state(thread.into());
    }

    /// Abandons the currently executing thread because of `error`.
    ///
    /// The thread is removed from the queue on the next call to
    /// [`Self::advance`].
    fn abandon_current_thread(&mut self, error: LocatedError) -> Result<()> {
        let state = self.state_mut()?;
        warn!(path = %state.id(), %error, "abandoning path");
        state.abandon(error.clone());
        self.errors.add(error);
        self.current_thread_killed = true;
        Ok(())
    }

    /// Records the fatal `error` and returns every error seen so far.
    fn fail(&mut self, error: LocatedError) -> Errors {
        warn!(%error, "stopping exploration");
        self.errors.add(error);
        self.errors.clone()
    }
}

/// A property key after evaluation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PropertyKey {
    /// The key is concretely known.
    Name(String),

    /// The key depends on attacker-controlled input.
    Symbolic(BoxedVal),

    /// The key is fixed by the program, but its string form is not modelled,
    /// such as the result of calling a user-defined `toString`.
    Opaque(BoxedVal),
}

impl PropertyKey {
    /// Converts the key back into a value recorded at `location`.
    #[must_use]
    pub fn into_value(self, location: u32) -> BoxedVal {
        match self {
            Self::Name(name) => {
                SymbolicValue::known(location, KnownData::Str(name), Provenance::Execution)
            }
            Self::Symbolic(value) | Self::Opaque(value) => value,
        }
    }
}

/// The name a symbolic key is taken to equal on one branch of a fork.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum KeyChoice<'a> {
    /// The key equals this sensitive name.
    Name(&'a str),

    /// The key differs from every sensitive name.
    Unresolved,
}

/// The data produced by executing a program to completion.
#[derive(Clone, Debug)]
pub struct ExecutionResult {
    /// The final state of every path, ordered by path identifier.
    pub states: Vec<PathState>,

    /// The errors that caused paths to be abandoned.
    ///
    /// Unlike a failed run, a non-empty list here still means every path was
    /// explored to its end, as abandoning a path is itself a result.
    pub errors: Errors,
}

/// The configuration for the virtual machine instance.
///
/// It can be deserialized, with any missing field taking its default value.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    /// The security-relevant property names that a symbolic key is forked
    /// against, in fork order.
    ///
    /// Defaults to [`DEFAULT_SENSITIVE_NAMES`].
    pub sensitive_names: Vec<String>,

    /// The member names that every object resolves even without an own
    /// property of that name.
    ///
    /// Defaults to [`DEFAULT_BUILT_IN_MEMBERS`].
    pub built_in_members: Vec<String>,

    /// The property names whose assignment relinks an object's prototype.
    ///
    /// Defaults to [`DEFAULT_PROTOTYPE_PIVOTS`].
    pub prototype_pivots: Vec<String>,

    /// The maximum number of path states that may be created over the run,
    /// including the initial one.
    ///
    /// Defaults to [`DEFAULT_MAXIMUM_PATHS`].
    pub maximum_paths: usize,

    /// The maximum number of forks along any single path.
    ///
    /// Defaults to [`DEFAULT_MAXIMUM_FORK_DEPTH`].
    pub maximum_fork_depth: usize,

    /// Whether reads under a symbolic key fork in the same way as writes.
    ///
    /// Defaults to [`DEFAULT_FORK_ON_SYMBOLIC_READS`].
    pub fork_on_symbolic_reads: bool,
}

impl Config {
    /// Sets the `sensitive_names` config parameter to `names`.
    #[must_use]
    pub fn with_sensitive_names(
        mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.sensitive_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the `built_in_members` config parameter to `names`.
    #[must_use]
    pub fn with_built_in_members(
        mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.built_in_members = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the `prototype_pivots` config parameter to `names`.
    #[must_use]
    pub fn with_prototype_pivots(
        mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.prototype_pivots = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the `maximum_paths` config parameter to `value`.
    #[must_use]
    pub fn with_maximum_paths(mut self, value: usize) -> Self {
        self.maximum_paths = value;
        self
    }

    /// Sets the `maximum_fork_depth` config parameter to `value`.
    #[must_use]
    pub fn with_maximum_fork_depth(mut self, value: usize) -> Self {
        self.maximum_fork_depth = value;
        self
    }

    /// Sets the `fork_on_symbolic_reads` config parameter to `value`.
    #[must_use]
    pub fn with_fork_on_symbolic_reads(mut self, value: bool) -> Self {
        self.fork_on_symbolic_reads = value;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        let sensitive_names = DEFAULT_SENSITIVE_NAMES.map(String::from).to_vec();
        let built_in_members = DEFAULT_BUILT_IN_MEMBERS.map(String::from).to_vec();
        let prototype_pivots = DEFAULT_PROTOTYPE_PIVOTS.map(String::from).to_vec();
        let maximum_paths = DEFAULT_MAXIMUM_PATHS;
        let maximum_fork_depth = DEFAULT_MAXIMUM_FORK_DEPTH;
        let fork_on_symbolic_reads = DEFAULT_FORK_ON_SYMBOLIC_READS;
        Self {
            sensitive_names,
            built_in_members,
            prototype_pivots,
            maximum_paths,
            maximum_fork_depth,
            fork_on_symbolic_reads,
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::{atomic::AtomicBool, Arc};

    use crate::{
        error::execution::{Budget, Error},
        operation::{
            property::{Get, Set},
            symbolic::IntroduceSymbolic,
        },
        program::{Literal, ObjectDeclaration, Operand, Program},
        vm::{
            state::constraint::{Constraint, Relation},
            Config,
            VM,
        },
        watchdog::{FlagWatchdog, LazyWatchdog},
    };

    /// Builds `customer = { role: "user" }; customer[p] = t`.
    fn single_write() -> Program {
        Program::new()
            .with_object(
                ObjectDeclaration::new("customer").with_property("role", Literal::string("user")),
            )
            .then(IntroduceSymbolic::new("p", "p"))
            .then(IntroduceSymbolic::new("t", "t"))
            .then(Set::new(
                Operand::binding("customer"),
                Operand::binding("p"),
                Operand::binding("t"),
            ))
    }

    #[test]
    fn symbolic_write_forks_once_per_name_plus_one() -> anyhow::Result<()> {
        let names = ["role", "__proto__", "toString"];
        let config = Config::default().with_sensitive_names(names);
        let mut vm = VM::new(&single_write(), config, LazyWatchdog.in_rc())?;
        vm.execute()?;

        let result = vm.consume();
        assert_eq!(result.states.len(), names.len() + 1);
        assert!(result.errors.is_empty());

        // Each forked path fixes the key to exactly one name.
        for (state, name) in result.states.iter().skip(1).zip(names) {
            let equalities: Vec<&Constraint> = state
                .constraints()
                .as_slice()
                .iter()
                .filter(|c| c.relation == Relation::Equal)
                .collect();
            assert_eq!(equalities.len(), 1);
            assert_eq!(equalities[0].name, name);
        }

        // The initial path becomes the branch excluding every name.
        let else_branch = &result.states[0];
        assert_eq!(else_branch.constraints().len(), names.len());
        assert!(else_branch
            .constraints()
            .as_slice()
            .iter()
            .all(|c| c.relation == Relation::NotEqual));

        Ok(())
    }

    #[test]
    fn empty_registry_does_not_fork() -> anyhow::Result<()> {
        let config = Config::default().with_sensitive_names(Vec::<String>::new());
        let mut vm = VM::new(&single_write(), config, LazyWatchdog.in_rc())?;
        vm.execute()?;

        let result = vm.consume();
        assert_eq!(result.states.len(), 1);
        assert_eq!(result.states[0].heap().len(), 1);

        Ok(())
    }

    #[test]
    fn resolved_keys_do_not_fork_again() -> anyhow::Result<()> {
        let program = single_write().then(Set::new(
            Operand::binding("customer"),
            Operand::binding("p"),
            Operand::literal(Literal::string("again")),
        ));
        let config = Config::default().with_sensitive_names(["role", "isAdmin"]);
        let mut vm = VM::new(&program, config, LazyWatchdog.in_rc())?;
        vm.execute()?;

        assert_eq!(vm.consume().states.len(), 3);

        Ok(())
    }

    #[test]
    fn exceeding_the_path_budget_is_fatal() -> anyhow::Result<()> {
        let config = Config::default()
            .with_sensitive_names(["role", "isAdmin"])
            .with_maximum_paths(2);
        let mut vm = VM::new(&single_write(), config, LazyWatchdog.in_rc())?;

        let errors = vm.execute().unwrap_err();
        assert!(errors.any_payload(|e| *e
            == Error::BudgetExceeded {
                budget: Budget::Paths,
                limit:  2,
            }));

        Ok(())
    }

    #[test]
    fn exceeding_the_fork_depth_is_fatal() -> anyhow::Result<()> {
        let program = single_write()
            .then(IntroduceSymbolic::new("q", "q"))
            .then(Set::new(
                Operand::binding("customer"),
                Operand::binding("q"),
                Operand::binding("t"),
            ));
        let config = Config::default()
            .with_sensitive_names(["role"])
            .with_maximum_fork_depth(1);
        let mut vm = VM::new(&program, config, LazyWatchdog.in_rc())?;

        let errors = vm.execute().unwrap_err();
        assert!(errors.any_payload(|e| matches!(
            e,
            Error::BudgetExceeded {
                budget: Budget::ForkDepth,
                ..
            }
        )));

        Ok(())
    }

    #[test]
    fn watchdog_stops_execution() -> anyhow::Result<()> {
        let flag = Arc::new(AtomicBool::new(true));
        let watchdog = FlagWatchdog::new(flag).polling_every(1).in_rc();
        let mut vm = VM::new(&single_write(), Config::default(), watchdog)?;

        let errors = vm.execute().unwrap_err();
        assert!(errors.any_payload(|e| *e == Error::StoppedByWatchdog));
        assert!(!vm.is_complete());

        Ok(())
    }

    #[test]
    fn failures_abandon_only_their_path() -> anyhow::Result<()> {
        let program = single_write().then(Get::new(
            Operand::binding("missing"),
            Operand::literal(Literal::string("role")),
            "copy",
        ));
        let config = Config::default().with_sensitive_names(["role"]);
        let mut vm = VM::new(&program, config, LazyWatchdog.in_rc())?;
        vm.execute()?;

        let result = vm.consume();
        assert_eq!(result.states.len(), 2);
        assert!(result.states.iter().all(|s| s.abandoned().is_some()));
        assert_eq!(result.errors.len(), 2);

        Ok(())
    }
}
