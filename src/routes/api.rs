use std::sync::Arc;

use actix_web::{HttpResponse, Responder, get, web};
use diesel::connection::SimpleConnection;
use log::error;
use serde::Serialize;

use crate::db::{DbPool, get_connection};

/// Route table produced by a [`RouteRegistrar`], applied to every API worker.
pub type ApiRoutes = Arc<dyn Fn(&mut web::ServiceConfig) + Send + Sync>;

/// Attaches API handlers once a live database handle exists.
pub trait RouteRegistrar {
    fn register(&self, pool: DbPool) -> ApiRoutes;
}

/// Built-in routes served by the API.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoreRoutes;

impl RouteRegistrar for CoreRoutes {
    fn register(&self, pool: DbPool) -> ApiRoutes {
        Arc::new(move |cfg: &mut web::ServiceConfig| {
            cfg.app_data(web::Data::new(pool.clone()))
                .service(web::scope("/v1").service(api_v1_status));
        })
    }
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    database: &'static str,
}

#[get("/status")]
pub async fn api_v1_status(pool: web::Data<DbPool>) -> impl Responder {
    let database = match get_connection(&pool) {
        Ok(mut conn) => match conn.batch_execute("SELECT 1;") {
            Ok(()) => "up",
            Err(e) => {
                error!("Database status check failed: {e}");
                "down"
            }
        },
        Err(_) => "down",
    };

    HttpResponse::Ok().json(StatusResponse {
        status: "ok",
        database,
    })
}
