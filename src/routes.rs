use crate::{
    api::{attendance, scan, subject},
    config::Config,
    store::{IdentityStore, RecordStore},
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure<S>(cfg: &mut web::ServiceConfig, config: Config)
where
    S: RecordStore + IdentityStore + 'static,
{
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let scan_limiter = Arc::new(build_limiter(config.rate_scan_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let read_limiter = Arc::new(build_limiter(config.rate_read_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            // /rfid — the badge readers post here
            .service(
                web::resource("/rfid")
                    .wrap(scan_limiter.clone())
                    .route(web::post().to(scan::scan::<S>)),
            )
            // /attendance/{token}/{day}
            .service(
                web::resource("/attendance/{token}/{day}")
                    .wrap(read_limiter.clone())
                    .route(web::get().to(attendance::day_report::<S>)),
            )
            // /subjects
            .service(
                web::resource("/subjects")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(subject::create_subject::<S>))
                    .route(web::get().to(subject::list_subjects::<S>)),
            ),
    );
}

// SCAN
//  ├─ Absent  → Present : entry timestamp stamped
//  └─ Present → Absent  : overlap pass folds [entry, exit) into the periods
