pub mod availability_service;
pub mod booking_service;
pub mod catalog_service;
pub mod inventory_service;
pub mod notification_service;
pub mod payment_service;
pub mod pricing_service;

pub use availability_service::AvailabilityService;
pub use booking_service::BookingService;
pub use catalog_service::CatalogService;
pub use inventory_service::InventoryService;
pub use notification_service::NotificationService;
pub use payment_service::{HttpPaymentGateway, PaymentGateway, PaymentService};
pub use pricing_service::PricingService;
