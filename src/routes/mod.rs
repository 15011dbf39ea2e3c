pub mod auth;
pub mod criteria;
pub mod evaluations;
pub mod faculties;
pub mod schedule;
pub mod subjects;
pub mod users;

pub use auth::configure_auth_routes;
pub use criteria::configure_criteria_routes;
pub use evaluations::configure_evaluation_routes;
pub use faculties::configure_faculty_routes;
pub use schedule::configure_schedule_routes;
pub use subjects::configure_subject_routes;
pub use users::configure_user_routes;

use actix_web::web;

/// 注册全部 API 路由
pub fn configure_api_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_auth_routes)
        .configure(configure_user_routes)
        .configure(configure_subject_routes)
        .configure(configure_faculty_routes)
        .configure(configure_criteria_routes)
        .configure(configure_schedule_routes)
        .configure(configure_evaluation_routes);
}
