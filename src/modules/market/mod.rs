use actix_web::web;

mod resources;

pub(crate) fn register_services(app: &mut web::ServiceConfig) {
    app.service(
        web::resource("/api/market/price").route(web::get().to(resources::get_current_price)),
    )
    .service(
        web::resource("/api/market/historical")
            .route(web::get().to(resources::get_historical_price)),
    );
}
