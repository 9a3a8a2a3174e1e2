//! Region and parcel lookup flows against the registry.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, info};
use url::Url;

use crate::cache::{CacheStore, LookupCache, MemoryStore, SledStore};
use crate::config::{Config, LinkConfig};
use crate::error::{LocatorError, Result};
use crate::geometry::{first_vertex, TransverseMercator};
use crate::models::{AdminHierarchy, GeoPoint, Parcel, ParcelQuery, Region};
use crate::uldk::{decode_parcel, decode_regions, RegistryRequest, RegistryTransport, UldkClient};

pub struct ParcelResolver {
    transport: Arc<dyn RegistryTransport>,
    cache: LookupCache,
    projection: TransverseMercator,
    links: LinkConfig,
}

impl ParcelResolver {
    pub fn new(transport: Arc<dyn RegistryTransport>, cache: LookupCache, links: LinkConfig) -> Self {
        Self {
            transport,
            cache,
            projection: TransverseMercator::puwg1992(),
            links,
        }
    }

    /// Resolver talking to the configured registry, with a sled cache when a path is set
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.registry.base_url)
            .with_context(|| format!("Invalid registry URL {}", config.registry.base_url))?;
        let client = UldkClient::new(
            base_url,
            Duration::from_secs(config.registry.timeout_secs),
            &config.registry.user_agent,
        )
        .context("Failed to create HTTP client")?;

        let store: Arc<dyn CacheStore> = match &config.cache.path {
            Some(path) => Arc::new(SledStore::open(path).context("Failed to open cache")?),
            None => Arc::new(MemoryStore::new()),
        };

        Ok(Self::new(
            Arc::new(client),
            LookupCache::new(store),
            config.links.clone(),
        ))
    }

    /// Cadastral regions of a municipality (`146501_1`), served from cache when possible
    pub async fn regions(&self, municipality_id: &str) -> Result<Vec<Region>> {
        let regions = self
            .cache
            .get_or_fetch(municipality_id, move || async move {
                let request = RegistryRequest::regions(municipality_id);
                let body = self.transport.fetch(&request).await?;
                decode_regions(&body)
            })
            .await;

        match &regions {
            Ok(regions) => debug!("{} regions for {}", regions.len(), municipality_id),
            Err(LocatorError::NotFound) => info!("Cannot find regions for {}", municipality_id),
            Err(_) => {}
        }
        regions
    }

    /// Region lookup by code tuple; an unknown municipality is `NotFound`
    pub async fn regions_for(
        &self,
        hierarchy: &AdminHierarchy,
        voivodeship: &str,
        county: &str,
        municipality: &str,
        kind: &str,
    ) -> Result<Vec<Region>> {
        let municipality = hierarchy
            .municipality(voivodeship, county, municipality, kind)
            .ok_or(LocatorError::NotFound)?;
        self.regions(&hierarchy.municipality_identifier(municipality))
            .await
    }

    /// Build a query from user input and resolve it
    pub async fn parcel(&self, number: &str, region_code: Option<&str>) -> Result<Parcel> {
        let query = ParcelQuery::from_input(number, region_code)?;
        self.resolve(&query).await
    }

    /// Fetch a parcel, locate its first vertex and derive links
    pub async fn resolve(&self, query: &ParcelQuery) -> Result<Parcel> {
        let request = RegistryRequest::parcel(query);
        let body = self.transport.fetch(&request).await?;
        let record = decode_parcel(&body)?;

        let vertex = first_vertex(&record.geometry)?;
        let position = GeoPoint::from(self.projection.inverse(vertex));
        debug!(
            "Parcel {} vertex ({}, {}) -> ({}, {})",
            record.id, vertex.x, vertex.y, position.lat, position.lon
        );

        Ok(Parcel {
            map_link: self.links.map_link(position.lat, position.lon),
            registry_link: self.links.registry_link(&record.id),
            id: record.id,
            parcel_number: record.parcel_number,
            position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teryt::parse_hierarchy;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const PARCEL_BODY: &str =
        "1\n146501_1.0001.12/3|12/3|SRID=2180;POLYGON((741707.5 382851.1,741738.0 382892.8))\n";

    /// Answers every request with the same body and records what was asked
    struct MockTransport {
        body: String,
        requests: Mutex<Vec<RegistryRequest>>,
    }

    impl MockTransport {
        fn new(body: &str) -> Arc<Self> {
            Arc::new(Self {
                body: body.to_string(),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<RegistryRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RegistryTransport for MockTransport {
        async fn fetch(&self, request: &RegistryRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.body.clone())
        }
    }

    fn resolver(transport: Arc<MockTransport>) -> ParcelResolver {
        let cache = LookupCache::new(Arc::new(MemoryStore::new()));
        ParcelResolver::new(transport, cache, LinkConfig::default())
    }

    #[test]
    fn test_from_config() {
        assert!(ParcelResolver::from_config(&Config::default()).is_ok());

        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.cache.path = Some(dir.path().join("cache"));
        assert!(ParcelResolver::from_config(&config).is_ok());

        config.registry.base_url = "not a url".to_string();
        assert!(ParcelResolver::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_fully_qualified_identifier_used_as_is() {
        let transport = MockTransport::new(PARCEL_BODY);
        let resolver = resolver(transport.clone());

        resolver.parcel("146501_1", Some("999")).await.unwrap();
        assert_eq!(transport.requests()[0].id, "146501_1");
    }

    #[tokio::test]
    async fn test_number_composed_with_region() {
        let transport = MockTransport::new(PARCEL_BODY);
        let resolver = resolver(transport.clone());

        resolver.parcel("12", Some("146501.0001")).await.unwrap();
        let requests = transport.requests();
        assert_eq!(requests[0].id, "146501.0001.12");
        assert_eq!(requests[0].kind.as_str(), "GetParcelByIdOrNr");
    }

    #[tokio::test]
    async fn test_insufficient_query_makes_no_request() {
        let transport = MockTransport::new(PARCEL_BODY);
        let resolver = resolver(transport.clone());

        let result = resolver.parcel("12", None).await;
        assert!(matches!(result, Err(LocatorError::InsufficientQuery)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_parcel_links_use_transformed_position() {
        let resolver = resolver(MockTransport::new(PARCEL_BODY));
        let parcel = resolver.parcel("146501_1.0001.12/3", None).await.unwrap();

        assert_eq!(parcel.id, "146501_1.0001.12/3");
        assert_eq!(parcel.parcel_number, "12/3");

        let expected = TransverseMercator::puwg1992().inverse(geo::Coord {
            x: 741707.5,
            y: 382851.1,
        });
        assert_eq!(parcel.position.lat, expected.y());
        assert_eq!(parcel.position.lon, expected.x());
        assert_eq!(
            parcel.map_link,
            format!("https://www.google.com/maps?q={},{}", expected.y(), expected.x())
        );
        assert!(!parcel.map_link.contains("741707.5"));
        assert_eq!(
            parcel.registry_link,
            "https://mapy.geoportal.gov.pl/imap/Imgp_2.html?identifyParcel=146501_1.0001.12/3"
        );
    }

    #[tokio::test]
    async fn test_parcel_not_found() {
        let resolver = resolver(MockTransport::new("-1 brak wyników"));
        let result = resolver.parcel("146501_1.0001.999", None).await;
        assert!(matches!(result, Err(LocatorError::NotFound)));
    }

    #[tokio::test]
    async fn test_parcel_bad_geometry() {
        let resolver = resolver(MockTransport::new("1\nid|12|SRID=2180;POINT(1 2)"));
        let result = resolver.parcel("146501_1.0001.12", None).await;
        assert!(matches!(result, Err(LocatorError::InvalidGeometry(_))));
        assert!(result.unwrap_err().is_decode_error());
    }

    #[tokio::test]
    async fn test_regions_cached_between_calls() {
        let transport = MockTransport::new("0\n146501.0001|Śródmieście\n146501.0002|Mokotów");
        let resolver = resolver(transport.clone());

        let first = resolver.regions("146501_1").await.unwrap();
        let second = resolver.regions("146501_1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0], RegistryRequest::regions("146501_1"));
    }

    #[tokio::test]
    async fn test_regions_not_found_not_cached() {
        let transport = MockTransport::new("-1");
        let resolver = resolver(transport.clone());

        assert!(matches!(
            resolver.regions("146501_1").await,
            Err(LocatorError::NotFound)
        ));
        assert!(resolver.regions("146501_1").await.is_err());
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_regions_for_hierarchy_codes() {
        let hierarchy = parse_hierarchy(
            "WOJ;POW;GMI;RODZ;NAZWA;NAZWA_OBSZARU\n\
             14;;;;MAZOWIECKIE;województwo\n\
             14;65;;;Warszawa;powiat\n\
             14;65;01;1;Warszawa;gmina miejska\n",
        );
        let transport = MockTransport::new("0\n146501.0001|Śródmieście");
        let resolver = resolver(transport.clone());

        let regions = resolver
            .regions_for(&hierarchy, "14", "65", "01", "1")
            .await
            .unwrap();
        assert_eq!(regions, vec![Region::new("Śródmieście", "146501.0001")]);
        assert_eq!(transport.requests()[0].id, "146501_1");

        let unknown = resolver.regions_for(&hierarchy, "14", "65", "02", "2").await;
        assert!(matches!(unknown, Err(LocatorError::NotFound)));
    }
}
