//! Report fetching, aggregation, rendering and delivery.

pub mod aggregator;
pub mod fetcher;
pub mod mailer;
pub mod pipeline;
pub mod renderer;
pub mod report_source;

pub use aggregator::aggregate;
pub use fetcher::{fetch_all, fetch_current, FetchOutcome};
pub use mailer::{Deliverer, DeliveryReceipt, Envelope, SmtpDeliverer};
pub use pipeline::{NotificationPipeline, PipelineSettings, PipelineState};
pub use renderer::{HtmlRenderer, RenderedDocument, Renderer};
pub use report_source::{HttpReportSource, ReportFormat, ReportSource};
