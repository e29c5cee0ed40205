use actix_web::web;

mod resources;
mod schemas;

pub(crate) fn register_services(app: &mut web::ServiceConfig) {
    app.service(web::resource("/api/health").route(web::get().to(resources::get_health)));
}
