//! Business logic services for the Retail Back Office

pub mod auth;
pub mod catalog;
pub mod employee;
pub mod finance;
pub mod ledger;
pub mod movement;
pub mod order;
pub mod product;
pub mod reporting;
pub mod shop;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use employee::EmployeeService;
pub use finance::FinanceService;
pub use movement::MovementService;
pub use order::OrderService;
pub use product::ProductService;
pub use reporting::ReportingService;
pub use shop::ShopService;
