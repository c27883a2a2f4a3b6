use std::fmt::{Display, Formatter, Result as FmtResult};

/// Root error type for the entire application
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    Domain(DomainError),
    Application(ApplicationError),
    Infrastructure(InfrastructureError),
}

/// Domain layer specific errors
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    InvalidTicker(String),
    InvalidTimestamp(String),
    InvalidRange(String),
}

/// Application layer errors
#[derive(Debug, Clone, PartialEq)]
pub enum ApplicationError {
    Configuration(String),
}

/// Infrastructure layer errors
#[derive(Debug, Clone, PartialEq)]
pub enum InfrastructureError {
    Repository(RepositoryError),
    Network(NetworkError),
    Rendering(RenderingError),
}

/// Repository operation errors
#[derive(Debug, Clone, PartialEq)]
pub enum RepositoryError {
    /// The backend answered with an explicit `error` payload
    Upstream(String),
    ParseError(String),
}

/// Network-related errors
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    HttpRequestFailed(String),
    HttpStatus { status: u16, text: String },
}

/// Chart library errors
#[derive(Debug, Clone, PartialEq)]
pub enum RenderingError {
    ContainerNotFound(String),
    ChartCreationFailed(String),
    SeriesCreationFailed(String),
    ObserverFailed(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AppError::Domain(e) => write!(f, "Domain Error: {}", e),
            AppError::Application(e) => write!(f, "Application Error: {}", e),
            AppError::Infrastructure(e) => write!(f, "Infrastructure Error: {}", e),
        }
    }
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::InvalidTicker(msg) => write!(f, "Invalid ticker: {}", msg),
            DomainError::InvalidTimestamp(msg) => write!(f, "Invalid timestamp: {}", msg),
            DomainError::InvalidRange(msg) => write!(f, "Invalid range: {}", msg),
        }
    }
}

impl Display for ApplicationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ApplicationError::Configuration(msg) => write!(f, "Configuration: {}", msg),
        }
    }
}

impl Display for InfrastructureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            InfrastructureError::Repository(e) => write!(f, "Repository: {}", e),
            InfrastructureError::Network(e) => write!(f, "Network: {}", e),
            InfrastructureError::Rendering(e) => write!(f, "Rendering: {}", e),
        }
    }
}

impl Display for RepositoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RepositoryError::Upstream(msg) => write!(f, "{}", msg),
            RepositoryError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl Display for NetworkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            NetworkError::HttpRequestFailed(msg) => write!(f, "HTTP request failed: {}", msg),
            NetworkError::HttpStatus { status, text } => write!(f, "HTTP error: {} - {}", status, text),
        }
    }
}

impl Display for RenderingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RenderingError::ContainerNotFound(id) => write!(f, "Container '{}' not found", id),
            RenderingError::ChartCreationFailed(msg) => write!(f, "Chart creation failed: {}", msg),
            RenderingError::SeriesCreationFailed(msg) => write!(f, "Series creation failed: {}", msg),
            RenderingError::ObserverFailed(msg) => write!(f, "Resize observer failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for InfrastructureError {}

impl From<DomainError> for AppError {
    fn from(error: DomainError) -> Self {
        AppError::Domain(error)
    }
}

impl From<ApplicationError> for AppError {
    fn from(error: ApplicationError) -> Self {
        AppError::Application(error)
    }
}

impl From<InfrastructureError> for AppError {
    fn from(error: InfrastructureError) -> Self {
        AppError::Infrastructure(error)
    }
}

impl From<RepositoryError> for InfrastructureError {
    fn from(error: RepositoryError) -> Self {
        InfrastructureError::Repository(error)
    }
}

impl From<NetworkError> for InfrastructureError {
    fn from(error: NetworkError) -> Self {
        InfrastructureError::Network(error)
    }
}

impl From<RenderingError> for InfrastructureError {
    fn from(error: RenderingError) -> Self {
        InfrastructureError::Rendering(error)
    }
}

pub type RepositoryResult<T> = Result<T, InfrastructureError>;
pub type RenderingResult<T> = Result<T, RenderingError>;
