use actix_web::web;

mod data_provider;
mod resources;
mod schemas;

pub(crate) fn register_services(app: &mut web::ServiceConfig) {
    app.service(web::resource("/api/eth/block").route(web::get().to(resources::get_block_number)))
        .service(web::resource("/api/eth/balance").route(web::get().to(resources::get_balance)))
        .service(
            web::resource("/api/eth/store-balance").route(web::get().to(resources::store_balance)),
        )
        .service(
            web::resource("/api/eth/get-token-balances")
                .route(web::get().to(resources::get_token_balances)),
        )
        .service(
            web::resource("/api/eth/token-balances")
                .route(web::get().to(resources::get_live_token_balances)),
        )
        .service(
            web::resource("/api/eth/store-token-balances")
                .route(web::get().to(resources::store_token_balances)),
        )
        .service(
            web::resource("/api/eth/latest-token-balances")
                .route(web::get().to(resources::get_latest_token_balances)),
        );
}
