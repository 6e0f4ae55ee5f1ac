//! Sample pact documents and a seeded registry.

use pact_registry::{
    MemoryPactStore, NewVerification, Pact, PactPublicationResolver, Pacticipant,
    PublishRequest, RegistryResult, Verification, Version,
};
use serde_json::json;
use std::sync::Arc;

/// A minimal pact document with one interaction.
#[must_use]
pub fn pact_json(consumer: &str, provider: &str, description: &str) -> String {
    json!({
        "consumer": { "name": consumer },
        "provider": { "name": provider },
        "interactions": [{
            "description": description,
            "request": { "method": "GET", "path": "/things" },
            "response": { "status": 200 }
        }],
        "metadata": { "pactSpecification": { "version": "2.0.0" } }
    })
    .to_string()
}

/// The same document as [`pact_json`] with keys written in a different order.
#[must_use]
pub fn reordered_pact_json(consumer: &str, provider: &str, description: &str) -> String {
    format!(
        concat!(
            r#"{{"metadata":{{"pactSpecification":{{"version":"2.0.0"}}}},"#,
            r#""interactions":[{{"response":{{"status":200}},"#,
            r#""request":{{"path":"/things","method":"GET"}},"description":"{}"}}],"#,
            r#""provider":{{"name":"{}"}},"consumer":{{"name":"{}"}}}}"#
        ),
        description, provider, consumer
    )
}

/// An in-memory registry with one consumer and one provider registered.
pub struct SeededRegistry {
    /// Backing store
    pub store: Arc<MemoryPactStore>,
    /// Resolver over the store
    pub resolver: PactPublicationResolver<MemoryPactStore>,
    /// Registered consumer
    pub consumer: Pacticipant,
    /// Registered provider
    pub provider: Pacticipant,
}

impl SeededRegistry {
    /// Seed a registry with the given pacticipants.
    pub async fn new(consumer: &str, provider: &str) -> Self {
        Self::with_store(MemoryPactStore::new(), consumer, provider).await
    }

    /// Seed a registry over a preconfigured store.
    pub async fn with_store(store: MemoryPactStore, consumer: &str, provider: &str) -> Self {
        let store = Arc::new(store);
        let consumer = store.create_pacticipant(consumer).await;
        let provider = store.create_pacticipant(provider).await;
        Self {
            resolver: PactPublicationResolver::new(Arc::clone(&store)),
            store,
            consumer,
            provider,
        }
    }

    /// Register (or reuse) a consumer version.
    ///
    /// # Panics
    ///
    /// Panics if the consumer is missing from the store.
    pub async fn version(&self, number: &str) -> Version {
        self.store
            .create_version(self.consumer.id, number)
            .await
            .expect("consumer is registered")
    }

    /// Build a publish request for a consumer version.
    pub async fn request(&self, number: &str, content: &str) -> PublishRequest {
        let version = self.version(number).await;
        PublishRequest {
            consumer_version_id: version.id,
            provider_id: self.provider.id,
            consumer_id: self.consumer.id,
            json_content: content.to_string(),
        }
    }

    /// Publish or update the pact for a consumer version.
    ///
    /// # Errors
    ///
    /// Propagates registry errors.
    pub async fn publish(&self, number: &str, content: &str) -> RegistryResult<Pact> {
        let request = self.request(number, content).await;
        self.resolver.publish_or_update(&request).await
    }

    /// Publish a sequence of versions "1", "2", ... with the given contents.
    ///
    /// # Panics
    ///
    /// Panics if any publish fails.
    pub async fn publish_history(&self, contents: &[String]) -> Vec<Pact> {
        let mut pacts = Vec::with_capacity(contents.len());
        for (i, content) in contents.iter().enumerate() {
            let number = (i + 1).to_string();
            pacts.push(self.publish(&number, content).await.expect("publish succeeds"));
        }
        pacts
    }

    /// Tag a consumer version.
    ///
    /// # Panics
    ///
    /// Panics if the version cannot be tagged.
    pub async fn tag(&self, number: &str, tag: &str) {
        let version = self.version(number).await;
        self.store
            .tag_version(version.id, tag)
            .await
            .expect("version is registered");
    }

    /// Record a verification of a pact's content.
    ///
    /// # Panics
    ///
    /// Panics if the pact version is unknown.
    pub async fn verify(&self, pact: &Pact, provider_version: &str, success: bool) -> Verification {
        self.store
            .record_verification(NewVerification::new(pact.pact_version_id, provider_version, success))
            .await
            .expect("pact version is registered")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pact_registry::SemanticDiffer;

    #[test]
    fn test_reordered_json_is_structurally_equal() {
        let a = pact_json("Foo", "Bar", "get things");
        let b = reordered_pact_json("Foo", "Bar", "get things");
        assert_ne!(a, b);
        assert!(!SemanticDiffer.differs(&a, &b).unwrap());
    }

    #[tokio::test]
    async fn test_seeded_registry_publishes() {
        let registry = SeededRegistry::new("Foo", "Bar").await;
        let pact = registry
            .publish("1.0.0", &pact_json("Foo", "Bar", "get things"))
            .await
            .unwrap();

        assert_eq!(pact.consumer_name(), "Foo");
        assert_eq!(pact.provider_name(), "Bar");
        assert_eq!(pact.revision_number, 1);
        assert_eq!(pact.order(), 1);
    }
}
