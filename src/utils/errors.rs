use thiserror::Error;

/// `ModellingError` enumerates the violations of the DEVS contract by a
/// model, and the failures to build a model's dynamics.  These are always
/// fatal to a simulation run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModellingError {
    /// Represents a dynamics returning a negative time advance
    #[error("Negative time advance in '{model}' ({time})")]
    NegativeTimeAdvance { model: String, time: f64 },

    /// Represents a dynamics returning a negative delay from its init function
    #[error("Negative init function in '{model}' ({time})")]
    NegativeInit { model: String, time: f64 },

    /// Represents an atomic model referencing a dynamics nobody registered
    #[error("Unknown dynamics '{dynamics}' for the atomic model '{model}'")]
    UnknownDynamics { model: String, dynamics: String },

    /// Represents a dynamics constructor rejecting its initialization events
    #[error("The dynamics '{dynamics}' cannot be built for the atomic model '{model}'")]
    DynamicsConstruction { model: String, dynamics: String },

    /// Represents an atomic model referencing an unknown condition
    #[error("Unknown condition '{condition}' for the atomic model '{model}'")]
    UnknownCondition { model: String, condition: String },

    /// Represents an atomic model referencing an unknown observable
    #[error("Unknown observable '{observable}' for the atomic model '{model}'")]
    UnknownObservable { model: String, observable: String },

    /// Represents a request to delete an atomic model without simulator
    #[error("Cannot delete an unknown atomic model '{0}'")]
    UnknownAtomicModel(String),

    /// Represents a failure reported by the dynamics code itself
    #[error("The dynamics of '{model}' failed: {message}")]
    Dynamics { model: String, message: String },
}

/// `DevsGraphError` enumerates the invalid structural operations on the
/// model graph.  An operation returning one of these errors has not
/// mutated the graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DevsGraphError {
    /// Represents a model reference that does not exist in the graph
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// Represents a connection where the coupled model is its own endpoint
    #[error("Cannot {operation} if {endpoint} is the coupled model '{model}'")]
    SelfConnection {
        operation: &'static str,
        endpoint: &'static str,
        model: String,
    },

    /// Represents a model that is not a child of the given coupled model
    #[error("The model '{model}' is not the child of '{parent}'")]
    NotAChild { model: String, parent: String },

    /// Represents a model name already used inside a coupled model
    #[error("Cannot add the model '{model}' into the coupled model '{parent}' (it already exists)")]
    DuplicateModel { model: String, parent: String },

    /// Represents a port lookup that failed
    #[error("Model '{model}' has no {direction} port '{port}'")]
    PortNotFound {
        model: String,
        direction: &'static str,
        port: String,
    },

    /// Represents a port name already used on a model
    #[error("Model '{model}' already has the {direction} port '{port}'")]
    DuplicatePort {
        model: String,
        direction: &'static str,
        port: String,
    },

    /// Represents an operation which requires a coupled model
    #[error("The model '{0}' is not a coupled model")]
    NotCoupled(String),

    /// Represents an operation which requires an atomic model
    #[error("The model '{0}' is not an atomic model")]
    NotAtomic(String),

    /// Represents a displace which would sever the graph consistency
    #[error("One or more models are connected to another model: {0}")]
    ConnectionProblem(String),

    /// Represents a displace toward a destination inside the moved models
    #[error("Cannot displace models into '{0}'")]
    InvalidDestination(String),

    /// Represents a flat connection which cannot be restored
    #[error("Cannot displace the connection {source_model} {source_port} to {destination_model} {destination_port}")]
    BasicConnection {
        source_model: String,
        source_port: String,
        destination_model: String,
        destination_port: String,
    },

    /// Represents an attach of a model which already has a parent
    #[error("Cannot attach the already attached model '{0}'")]
    AlreadyAttached(String),

    /// Represents a graph description which cannot be built
    #[error("Invalid model description: {0}")]
    InvalidDescription(String),
}

/// `InternalError` enumerates invariant violations inside the kernel.
/// They are programming errors and are never recovered locally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InternalError {
    /// Represents a use of a `StreamWriter` before `open`
    #[error("Oov: The output plug-in is not initialized, the StreamWriter::open() function was never called")]
    StreamWriterNotOpened,

    /// Represents a use of a `StreamWriter` after `close`
    #[error("Oov: The output plug-in `{0}' is closed")]
    StreamWriterClosed(String),

    /// Represents a failure to resolve or instantiate an output plug-in
    #[error("Oov: Can not open the plug-in `{plugin}': {cause}")]
    PluginLoad { plugin: String, cause: String },

    /// Represents a failure raised by an output plug-in
    #[error("Output plug-in `{plugin}': {message}")]
    Plugin { plugin: String, message: String },

    /// Represents an access to a cleared simulator
    #[error("Simulator destroyed")]
    SimulatorDestroyed,

    /// Represents an atomic model registered twice in the coordinator
    #[error("The atomic model '{0}' already has a simulator")]
    DuplicateSimulator(String),

    /// Represents an atomic model without simulator
    #[error("The simulator of the model '{0}' does not exist")]
    MissingSimulator(String),

    /// Represents a view name unknown to the coordinator
    #[error("The view '{0}' is unknown of coordinator view list")]
    UnknownView(String),

    /// Represents an output name unknown to the experiment
    #[error("The output '{0}' is unknown of the experiment")]
    UnknownOutput(String),

    /// Represents an operation issued on a coordinator which is not loaded
    #[error("The root coordinator has no model loaded")]
    NotLoaded,

    /// Represents a worker thread which panicked during the run
    #[error("The simulation worker panicked: {0}")]
    WorkerPanicked(String),
}

/// `SimulationError` enumerates all possible errors returned by devsim
#[derive(Error, Debug)]
pub enum SimulationError {
    /// A model violated the DEVS contract
    #[error(transparent)]
    Modelling(#[from] ModellingError),

    /// A structural graph operation was rejected
    #[error(transparent)]
    Graph(#[from] DevsGraphError),

    /// An invariant of the kernel was violated
    #[error(transparent)]
    Internal(#[from] InternalError),

    /// Represents an experiment which cannot drive a simulation
    #[error("Invalid experiment: {0}")]
    InvalidExperiment(String),

    /// Transparent serde_json errors
    #[error(transparent)]
    JSONError(#[from] serde_json::error::Error),

    /// Transparent serde_yaml errors
    #[error(transparent)]
    YAMLError(#[from] serde_yaml::Error),

    /// Transparent I/O errors, from plug-ins writing their output
    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

impl SimulationError {
    /// Builds the error a dynamics returns when its own logic fails.
    pub fn dynamics(model: &str, message: impl Into<String>) -> Self {
        ModellingError::Dynamics {
            model: model.to_string(),
            message: message.into(),
        }
        .into()
    }
}
