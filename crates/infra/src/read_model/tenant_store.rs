use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use availerp_core::TenantId;

/// Key/value storage partitioned by tenant.
///
/// Read models built on it are rebuildable from the event stream, so a
/// poisoned lock degrades to "nothing stored" instead of an error.
pub trait TenantStore<K, V>: Send + Sync {
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V>;

    fn upsert(&self, tenant_id: TenantId, key: K, value: V);

    /// Read-modify-write of one entry under a single write lock. `f` receives
    /// `None` when the key is absent; returning `None` removes the entry.
    fn update(&self, tenant_id: TenantId, key: K, f: &mut dyn FnMut(Option<V>) -> Option<V>);

    fn list(&self, tenant_id: TenantId) -> Vec<V>;

    /// Drop every record of a tenant (rebuild support).
    fn clear_tenant(&self, tenant_id: TenantId);
}

impl<K, V, S> TenantStore<K, V> for Arc<S>
where
    S: TenantStore<K, V> + ?Sized,
{
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V> {
        (**self).get(tenant_id, key)
    }

    fn upsert(&self, tenant_id: TenantId, key: K, value: V) {
        (**self).upsert(tenant_id, key, value)
    }

    fn update(&self, tenant_id: TenantId, key: K, f: &mut dyn FnMut(Option<V>) -> Option<V>) {
        (**self).update(tenant_id, key, f)
    }

    fn list(&self, tenant_id: TenantId) -> Vec<V> {
        (**self).list(tenant_id)
    }

    fn clear_tenant(&self, tenant_id: TenantId) {
        (**self).clear_tenant(tenant_id)
    }
}

#[derive(Debug)]
pub struct InMemoryTenantStore<K, V> {
    tenants: RwLock<HashMap<TenantId, HashMap<K, V>>>,
}

impl<K, V> InMemoryTenantStore<K, V> {
    pub fn new() -> Self {
        Self {
            tenants: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryTenantStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TenantStore<K, V> for InMemoryTenantStore<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, tenant_id: TenantId, key: &K) -> Option<V> {
        let tenants = self.tenants.read().ok()?;
        tenants.get(&tenant_id)?.get(key).cloned()
    }

    fn upsert(&self, tenant_id: TenantId, key: K, value: V) {
        if let Ok(mut tenants) = self.tenants.write() {
            tenants.entry(tenant_id).or_default().insert(key, value);
        }
    }

    fn update(&self, tenant_id: TenantId, key: K, f: &mut dyn FnMut(Option<V>) -> Option<V>) {
        let Ok(mut tenants) = self.tenants.write() else {
            return;
        };
        let records = tenants.entry(tenant_id).or_default();
        let current = records.remove(&key);
        if let Some(next) = f(current) {
            records.insert(key, next);
        }
    }

    fn list(&self, tenant_id: TenantId) -> Vec<V> {
        let Ok(tenants) = self.tenants.read() else {
            return vec![];
        };
        tenants
            .get(&tenant_id)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    fn clear_tenant(&self, tenant_id: TenantId) {
        if let Ok(mut tenants) = self.tenants.write() {
            tenants.remove(&tenant_id);
        }
    }
}
