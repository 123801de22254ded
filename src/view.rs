//! Views, perspectives and the identities used to find them.
//!
//! A handler's output is displayed by a [`View`]. Which view is chosen depends on a
//! [`ViewPerspectiveKey`]: the handler's [`ModelType`] paired with the [`Perspective`] its load step
//! returned. Where the view is shown, and with what navigation context, is described by a [`ViewEntry`]. Live
//! views are shared through [`ViewRef`] handles and cached by the [`ViewRegistry`].

use std::{
    any::{self, Any, TypeId},
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use serde::{Deserialize, Serialize};

use crate::{error::ViewError, id::ViewId, route::Parameters};

pub mod registry;

pub use registry::ViewRegistry;

/// A runtime tag for the type of model a handler produces and a view displays.
#[derive(Clone, Copy)]
pub struct ModelType {
    id: TypeId,
    name: &'static str,
}

impl ModelType {
    /// The model type tag for `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        ModelType {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
        }
    }

    /// The full type name of the model.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let end = self.name.find('<').unwrap_or(self.name.len());
        match self.name[..end].rfind("::") {
            Some(idx) => &self.name[idx + 2..],
            None => self.name,
        }
    }

    /// The [`TypeId`] of the model.
    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for ModelType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ModelType {}

impl Hash for ModelType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelType({})", self.name)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A type erased, cheaply cloneable model.
#[derive(Clone)]
pub struct AnyModel {
    model_type: ModelType,
    value: Arc<dyn Any + Send + Sync>,
}

impl AnyModel {
    /// Wraps a model.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        AnyModel {
            model_type: ModelType::of::<T>(),
            value: Arc::new(value),
        }
    }

    /// The type of the wrapped model.
    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// Returns `true` if the model is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrows the model as a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }
}

impl fmt::Debug for AnyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnyModel").field(&self.model_type).finish()
    }
}

/// A label selecting how a model should be displayed.
///
/// The associated constants cover the conventional list/create/read/update/delete views, but any label may
/// be used.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Perspective(Cow<'static, str>);

impl Perspective {
    /// The default perspective, usually a list or overview.
    pub const DEFAULT: Perspective = Perspective::from_static("");
    /// Displays a single model read-only.
    pub const READ: Perspective = Perspective::from_static("GET");
    /// Displays a form creating a new model.
    pub const CREATE: Perspective = Perspective::from_static("POST");
    /// Displays a form editing a model.
    pub const UPDATE: Perspective = Perspective::from_static("PUT");
    /// Displays a delete confirmation.
    pub const DELETE: Perspective = Perspective::from_static("DELETE");

    /// Creates a perspective from a static label.
    pub const fn from_static(label: &'static str) -> Self {
        Perspective(Cow::Borrowed(label))
    }

    /// Creates a perspective from any label.
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Perspective(label.into())
    }

    /// The label.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty, default label.
    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&'static str> for Perspective {
    fn from(label: &'static str) -> Self {
        Perspective::from_static(label)
    }
}

impl From<String> for Perspective {
    fn from(label: String) -> Self {
        Perspective(Cow::Owned(label))
    }
}

impl fmt::Debug for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Perspective({:?})", self.0)
    }
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies *what* to show: a model type displayed through a perspective.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ViewPerspectiveKey {
    model_type: ModelType,
    perspective: Perspective,
}

impl ViewPerspectiveKey {
    /// Creates a key.
    pub fn new(model_type: ModelType, perspective: impl Into<Perspective>) -> Self {
        ViewPerspectiveKey {
            model_type,
            perspective: perspective.into(),
        }
    }

    /// Creates a key for the model type `M`.
    pub fn of<M: ?Sized + 'static>(perspective: impl Into<Perspective>) -> Self {
        ViewPerspectiveKey::new(ModelType::of::<M>(), perspective)
    }

    /// The model type.
    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// The perspective.
    pub fn perspective(&self) -> &Perspective {
        &self.perspective
    }
}

impl fmt::Display for ViewPerspectiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.model_type, self.perspective)
    }
}

/// Identifies *where* and with what navigation context a perspective is shown.
///
/// Several entries may share one [`ViewPerspectiveKey`], for example a list pane and a detail pane showing
/// the same perspective in different viewports. Cached views are identified by key and viewport id; the uri
/// and parameters record the navigation that last targeted the entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewEntry {
    key: ViewPerspectiveKey,
    viewport_id: String,
    uri: String,
    parameters: Parameters,
}

impl ViewEntry {
    /// Creates an entry in the default (empty) viewport.
    pub fn new(key: ViewPerspectiveKey) -> Self {
        ViewEntry {
            key,
            viewport_id: String::new(),
            uri: String::new(),
            parameters: Parameters::new(),
        }
    }

    /// Places the entry in a viewport.
    pub fn in_viewport(mut self, viewport_id: impl Into<String>) -> Self {
        self.viewport_id = viewport_id.into();
        self
    }

    /// Sets the uri that led to this entry.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    /// Sets the navigation parameters.
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// The perspective key.
    pub fn key(&self) -> &ViewPerspectiveKey {
        &self.key
    }

    /// The viewport id. Empty for the default viewport.
    pub fn viewport_id(&self) -> &str {
        &self.viewport_id
    }

    /// The uri of the navigation.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The parameters of the navigation.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Returns `true` if both entries address the same cached view: same key and same viewport.
    pub fn same_slot(&self, other: &ViewEntry) -> bool {
        self.key == other.key && self.viewport_id == other.viewport_id
    }
}

/// A displayable unit provided by the host application.
///
/// The core never renders anything itself. It only chooses which view receives a model, creates it through
/// a registered factory when needed, and pushes models into it.
pub trait View: Send + 'static {
    /// The model this view displays.
    type Model: Clone + Send + Sync + 'static;

    /// Replaces the view's model.
    fn set_model(&mut self, model: Self::Model);

    /// Draws the view.
    fn render(&mut self) {}

    /// The model type tag of this view.
    fn model_type(&self) -> ModelType {
        ModelType::of::<Self::Model>()
    }
}

/// An object safe view, implemented for every [`View`].
pub(crate) trait AnyView: Send {
    fn set_model_any(&mut self, model: &AnyModel) -> Result<(), ViewError>;
    fn render_any(&mut self);
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<V: View> AnyView for V {
    fn set_model_any(&mut self, model: &AnyModel) -> Result<(), ViewError> {
        let typed = model
            .downcast_ref::<V::Model>()
            .ok_or_else(|| ViewError::ModelMismatch {
                expected: ModelType::of::<V::Model>(),
                found: model.model_type(),
            })?;
        self.set_model(typed.clone());
        Ok(())
    }

    fn render_any(&mut self) {
        self.render()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

type SharedView = Arc<Mutex<Box<dyn AnyView>>>;

/// A shared handle to a live view instance.
#[derive(Clone)]
pub struct ViewRef {
    id: ViewId,
    model_type: ModelType,
    type_name: &'static str,
    view: SharedView,
}

impl ViewRef {
    /// Wraps a view instance.
    pub fn new<V: View>(view: V) -> Self {
        let model_type = view.model_type();
        ViewRef::from_boxed(Box::new(view), model_type, any::type_name::<V>())
    }

    pub(crate) fn from_boxed(
        view: Box<dyn AnyView>,
        model_type: ModelType,
        type_name: &'static str,
    ) -> Self {
        ViewRef {
            id: ViewId::generate(),
            model_type,
            type_name,
            view: Arc::new(Mutex::new(view)),
        }
    }

    /// The unique id of this instance.
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// The model type the view displays.
    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// The concrete view type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Pushes a model into the view.
    pub fn set_model(&self, model: &AnyModel) -> Result<(), ViewError> {
        self.lock().set_model_any(model)
    }

    /// Renders the view.
    pub fn render(&self) {
        self.lock().render_any()
    }

    /// Runs `f` with mutable access to the view if it is a `V`.
    pub fn with<V: View, R>(&self, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let mut guard = self.lock();
        guard.as_any_mut().downcast_mut::<V>().map(f)
    }

    /// Returns `true` if both handles point at the same instance.
    pub fn ptr_eq(&self, other: &ViewRef) -> bool {
        Arc::ptr_eq(&self.view, &other.view)
    }

    /// Creates a weak handle which does not keep the view alive.
    pub fn downgrade(&self) -> WeakViewRef {
        WeakViewRef {
            id: self.id,
            model_type: self.model_type,
            type_name: self.type_name,
            view: Arc::downgrade(&self.view),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn AnyView>> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for ViewRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ViewRef {}

impl fmt::Debug for ViewRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewRef")
            .field("id", &self.id)
            .field("type", &self.type_name)
            .finish()
    }
}

/// A weak handle to a view, obtained from [`ViewRef::downgrade`].
#[derive(Clone)]
pub struct WeakViewRef {
    id: ViewId,
    model_type: ModelType,
    type_name: &'static str,
    view: Weak<Mutex<Box<dyn AnyView>>>,
}

impl WeakViewRef {
    /// The id of the referenced view.
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// Upgrades to a strong handle if the view is still alive.
    pub fn upgrade(&self) -> Option<ViewRef> {
        self.view.upgrade().map(|view| ViewRef {
            id: self.id,
            model_type: self.model_type,
            type_name: self.type_name,
            view,
        })
    }
}

impl fmt::Debug for WeakViewRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakViewRef")
            .field("id", &self.id)
            .field("type", &self.type_name)
            .finish()
    }
}
