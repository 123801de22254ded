//! Maps perspectives to view types and caches live views per viewport.
//!
//! The registry holds two tables. The type map associates a [`ViewPerspectiveKey`] with a factory able to
//! build the view for it. The instance cache holds every view built so far, keyed by its [`ViewEntry`]'s key
//! and viewport id, in creation order. Creation order matters: when tooling removes a cached view without an
//! exact viewport id, the most recently registered view for the perspective is removed.

use std::{any, collections::HashMap, fmt, sync::Arc};

use itertools::Itertools;
use tracing::trace;

use crate::error::ViewError;

use super::{AnyView, ModelType, View, ViewEntry, ViewPerspectiveKey, ViewRef};

type ViewFactory = Arc<dyn Fn() -> Box<dyn AnyView> + Send + Sync>;

#[derive(Clone)]
struct ViewType {
    type_name: &'static str,
    model_type: ModelType,
    factory: Option<ViewFactory>,
}

impl ViewType {
    fn build(&self) -> Option<ViewRef> {
        let factory = self.factory.as_ref()?;
        Some(ViewRef::from_boxed(
            factory(),
            self.model_type,
            self.type_name,
        ))
    }
}

/// A registry of view types and live view instances.
#[derive(Default)]
pub struct ViewRegistry {
    types: HashMap<ViewPerspectiveKey, ViewType>,
    cache: Vec<(ViewEntry, ViewRef)>,
}

impl ViewRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        ViewRegistry::default()
    }

    /// Maps `key` to the view type `V`, built with [`Default`] when needed.
    pub fn register<V>(&mut self, key: ViewPerspectiveKey) -> Result<(), ViewError>
    where
        V: View + Default,
    {
        self.register_factory(key, V::default)
    }

    /// Maps `key` to views built by `factory`.
    ///
    /// Fails with [`ViewError::ModelMismatch`] if the view's model type is not the key's model type. A later
    /// registration for the same key replaces the factory; views already cached are kept.
    pub fn register_factory<V, F>(
        &mut self,
        key: ViewPerspectiveKey,
        factory: F,
    ) -> Result<(), ViewError>
    where
        V: View,
        F: Fn() -> V + Send + Sync + 'static,
    {
        check_model_type::<V>(&key)?;
        trace!(%key, view = any::type_name::<V>(), "registered view type");
        self.types.insert(
            key,
            ViewType {
                type_name: any::type_name::<V>(),
                model_type: ModelType::of::<V::Model>(),
                factory: Some(Arc::new(move || Box::new(factory()) as Box<dyn AnyView>)),
            },
        );
        Ok(())
    }

    /// Registers an existing view instance for `entry`.
    ///
    /// The instance is cached under the entry, replacing any view already cached in the same slot. If the
    /// perspective has no view type yet, it becomes mapped, but further instances can not be built for it.
    pub fn register_instance<V>(&mut self, entry: ViewEntry, view: V) -> Result<ViewRef, ViewError>
    where
        V: View,
    {
        check_model_type::<V>(entry.key())?;
        self.types
            .entry(entry.key().clone())
            .or_insert_with(|| ViewType {
                type_name: any::type_name::<V>(),
                model_type: ModelType::of::<V::Model>(),
                factory: None,
            });

        let view = ViewRef::new(view);
        match self.cache.iter_mut().find(|(cached, _)| cached.same_slot(&entry)) {
            Some(slot) => *slot = (entry, view.clone()),
            None => self.cache.push((entry, view.clone())),
        }
        Ok(view)
    }

    /// Returns `true` if a view type is mapped for the key.
    pub fn contains_key(&self, key: &ViewPerspectiveKey) -> bool {
        self.types.contains_key(key)
    }

    /// The name of the view type mapped for the key.
    pub fn view_type_name(&self, key: &ViewPerspectiveKey) -> Option<&'static str> {
        self.types.get(key).map(|ty| ty.type_name)
    }

    /// Returns the view cached for the entry's key and viewport, creating and caching it on a miss.
    ///
    /// On a hit, the cached entry's uri and parameters are refreshed from `entry`.
    pub fn get_or_create(&mut self, entry: &ViewEntry) -> Result<ViewRef, ViewError> {
        if let Some((cached, view)) = self
            .cache
            .iter_mut()
            .find(|(cached, _)| cached.same_slot(entry))
        {
            *cached = entry.clone();
            return Ok(view.clone());
        }

        let ty = self
            .types
            .get(entry.key())
            .ok_or_else(|| ViewError::UnmappedPerspective {
                key: entry.key().clone(),
            })?;
        let view = ty.build().ok_or_else(|| ViewError::NotConstructible {
            key: entry.key().clone(),
        })?;
        trace!(
            key = %entry.key(),
            viewport = entry.viewport_id(),
            view = %view.id(),
            "created view"
        );
        self.cache.push((entry.clone(), view.clone()));
        Ok(view)
    }

    /// Looks up a cached view for the key in the default viewport.
    ///
    /// See [`ViewRegistry::get_in`].
    pub fn get(&self, key: &ViewPerspectiveKey) -> Option<ViewRef> {
        self.get_in(key, "")
    }

    /// Looks up a cached view for the key.
    ///
    /// A single cached view for the key is returned whatever its viewport. When several viewports show the
    /// key, the one with a matching viewport id is preferred, then the default viewport, then the first cached.
    pub fn get_in(&self, key: &ViewPerspectiveKey, viewport_id: &str) -> Option<ViewRef> {
        let matches = self
            .cache
            .iter()
            .filter(|(entry, _)| entry.key() == key)
            .collect_vec();
        let (_, view) = match matches.as_slice() {
            [] => return None,
            [single] => single,
            many => many
                .iter()
                .find(|(entry, _)| entry.viewport_id() == viewport_id)
                .or_else(|| many.iter().find(|(entry, _)| entry.viewport_id().is_empty()))
                .unwrap_or(&many[0]),
        };
        Some(view.clone())
    }

    /// Removes cached views for each of the keys, returning the removed views.
    ///
    /// For each key, a single cached view is removed outright. With several, the view in `viewport_id` is
    /// removed, or the most recently cached one if no viewport matches.
    pub fn remove_cached(
        &mut self,
        keys: &[ViewPerspectiveKey],
        viewport_id: &str,
    ) -> Vec<ViewRef> {
        let mut removed = Vec::new();
        for key in keys {
            let positions = self
                .cache
                .iter()
                .positions(|(entry, _)| entry.key() == key)
                .collect_vec();
            let idx = match positions.as_slice() {
                [] => continue,
                [single] => *single,
                many => many
                    .iter()
                    .copied()
                    .find(|&idx| self.cache[idx].0.viewport_id() == viewport_id)
                    .unwrap_or(many[many.len() - 1]),
            };
            let (entry, view) = self.cache.remove(idx);
            trace!(key = %entry.key(), viewport = entry.viewport_id(), "removed cached view");
            removed.push(view);
        }
        removed
    }

    /// Removes the view cached for exactly this entry's key and viewport.
    pub fn remove(&mut self, entry: &ViewEntry) -> Option<ViewRef> {
        let idx = self
            .cache
            .iter()
            .position(|(cached, _)| cached.same_slot(entry))?;
        Some(self.cache.remove(idx).1)
    }

    /// Cached entries in creation order.
    pub fn cached_entries(&self) -> impl Iterator<Item = &ViewEntry> + '_ {
        self.cache.iter().map(|(entry, _)| entry)
    }

    /// The number of cached views.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Drops every cached view, keeping the type map.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

fn check_model_type<V: View>(key: &ViewPerspectiveKey) -> Result<(), ViewError> {
    let found = ModelType::of::<V::Model>();
    if found != key.model_type() {
        return Err(ViewError::ModelMismatch {
            expected: key.model_type(),
            found,
        });
    }
    Ok(())
}

impl fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewRegistry")
            .field("types", &self.types.keys().collect_vec())
            .field("cache", &self.cache)
            .finish()
    }
}
