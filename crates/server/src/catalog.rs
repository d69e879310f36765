// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The fixed list of treatments offered on the website.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Service {
    /// Unique short identifier
    pub slug:         &'static str,
    pub name:         &'static str,
    pub duration_min: u32,
    /// Price in Hungarian forint
    pub price_huf:    u32,
    pub description:  &'static str,
}

pub static SERVICES: [Service; 4] = [
    Service {
        slug:         "traditional-thai",
        name:         "Traditional Thai Massage",
        duration_min: 60,
        price_huf:    18000,
        description:  "Full-body treatment combining acupressure, assisted yoga stretches, and \
                       rhythmic pressure.",
    },
    Service {
        slug:         "aroma-oil",
        name:         "Aroma Oil Massage",
        duration_min: 60,
        price_huf:    20000,
        description:  "Relaxing oil-based massage with aromatic essential oils.",
    },
    Service {
        slug:         "foot-reflexology",
        name:         "Foot Reflexology",
        duration_min: 45,
        price_huf:    12000,
        description:  "Targeted pressure-point massage focusing on the feet to relieve tension.",
    },
    Service {
        slug:         "back-shoulder",
        name:         "Back & Shoulder Massage",
        duration_min: 30,
        price_huf:    9000,
        description:  "Focused relief for back, neck, and shoulders.",
    },
];

/// All services, in declaration order.
#[must_use]
pub fn list_services() -> &'static [Service] { &SERVICES }

#[must_use]
pub fn find_service(slug: &str) -> Option<&'static Service> {
    SERVICES.iter().find(|service| service.slug == slug)
}

async fn services_handler() -> Json<&'static [Service]> { Json(list_services()) }

pub fn catalog_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/api/services", get(services_handler))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_catalog_shape() {
        let services = list_services();
        assert_eq!(services.len(), 4);
        assert!(
            services
                .iter()
                .all(|s| s.duration_min > 0 && s.price_huf > 0)
        );

        let slugs: HashSet<_> = services.iter().map(|s| s.slug).collect();
        assert_eq!(slugs.len(), services.len());
    }

    #[test]
    fn test_catalog_is_stable_across_calls() {
        assert_eq!(list_services(), list_services());
        let first = &list_services()[0];
        assert_eq!(first.slug, "traditional-thai");
        assert_eq!(first.price_huf, 18000);
        assert_eq!(list_services()[3].slug, "back-shoulder");
    }

    #[test]
    fn test_find_service() {
        assert_eq!(find_service("aroma-oil").unwrap().duration_min, 60);
        assert!(find_service("hot-stone").is_none());
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(&SERVICES[2]).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "slug": "foot-reflexology",
                "name": "Foot Reflexology",
                "duration_min": 45,
                "price_huf": 12000,
                "description": "Targeted pressure-point massage focusing on the feet to relieve tension.",
            })
        );
    }
}
