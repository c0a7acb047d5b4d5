pub mod dispatch_orchestrator;
pub mod task_service;
pub mod template_renderer;
pub mod template_service;
pub mod timezone_service;

pub use dispatch_orchestrator::{DispatchCompletion, DispatchError, DispatchOrchestrator};
pub use task_service::{RecurrenceInput, TaskError, TaskService};
pub use template_renderer::render_template;
pub use template_service::{TemplateError, TemplateService};
pub use timezone_service::{TimezoneError, TimezoneService};
