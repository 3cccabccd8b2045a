//! The static role × resource permission matrix.
//!
//! Every [`Resource`] must have a [`Row`] in [`row`]; the exhaustive `match`
//! there means a new resource does not compile until it is given one.
//! Resource names that arrive as strings and do not parse are rejected with
//! [`UnknownResource`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  error::{AuthError, UnknownResource},
  identity::{Identity, UserCategory},
};

// ─── Resources ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
  Recipes,
  Tips,
  Foods,
  Exercises,
  Profile,
  Favorites,
  Appointments,
  MealPlans,
  Measurements,
  Patients,
  Users,
  Settings,
}

impl Resource {
  pub const ALL: [Resource; 12] = [
    Resource::Recipes,
    Resource::Tips,
    Resource::Foods,
    Resource::Exercises,
    Resource::Profile,
    Resource::Favorites,
    Resource::Appointments,
    Resource::MealPlans,
    Resource::Measurements,
    Resource::Patients,
    Resource::Users,
    Resource::Settings,
  ];

  /// Canonical name used by endpoints.
  pub fn name(self) -> &'static str {
    match self {
      Resource::Recipes => "recetas",
      Resource::Tips => "consejos",
      Resource::Foods => "alimentos",
      Resource::Exercises => "ejercicios",
      Resource::Profile => "perfil",
      Resource::Favorites => "favoritos",
      Resource::Appointments => "citas",
      Resource::MealPlans => "planes",
      Resource::Measurements => "mediciones",
      Resource::Patients => "pacientes",
      Resource::Users => "usuarios",
      Resource::Settings => "configuracion",
    }
  }

  /// Parse a canonical name or its English alias. Matching is
  /// case-insensitive and ignores surrounding whitespace.
  pub fn parse(name: &str) -> Result<Self, UnknownResource> {
    let resource = match name.trim().to_lowercase().as_str() {
      "recetas" | "recipes" => Resource::Recipes,
      "consejos" | "tips" => Resource::Tips,
      "alimentos" | "foods" => Resource::Foods,
      "ejercicios" | "exercises" => Resource::Exercises,
      "perfil" | "profile" => Resource::Profile,
      "favoritos" | "favorites" => Resource::Favorites,
      "citas" | "appointments" => Resource::Appointments,
      "planes" | "plans" => Resource::MealPlans,
      "mediciones" | "measurements" => Resource::Measurements,
      "pacientes" | "patients" => Resource::Patients,
      "usuarios" | "users" => Resource::Users,
      "configuracion" | "settings" => Resource::Settings,
      _ => return Err(UnknownResource(name.to_owned())),
    };
    Ok(resource)
  }
}

impl fmt::Display for Resource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

// ─── Matrix ──────────────────────────────────────────────────────────────────

/// One resource's decisions, one column per category.
#[derive(Debug, Clone, Copy)]
struct Row {
  guest:         bool,
  regular:       bool,
  patient:       bool,
  nutritionist:  bool,
  administrator: bool,
}

impl Row {
  const fn public() -> Self {
    Row { guest: true, regular: true, patient: true, nutritionist: true, administrator: true }
  }

  const fn registered() -> Self {
    Row { guest: false, ..Row::public() }
  }

  const fn patients_and_staff() -> Self {
    Row { regular: false, ..Row::registered() }
  }

  const fn staff() -> Self {
    Row { patient: false, ..Row::patients_and_staff() }
  }

  fn get(self, category: UserCategory) -> bool {
    match category {
      UserCategory::Guest => self.guest,
      UserCategory::RegularUser => self.regular,
      UserCategory::PatientUser => self.patient,
      UserCategory::Nutritionist => self.nutritionist,
      UserCategory::Administrator => self.administrator,
    }
  }
}

fn row(resource: Resource) -> Row {
  match resource {
    Resource::Recipes
    | Resource::Tips
    | Resource::Foods
    | Resource::Exercises => Row::public(),
    Resource::Profile | Resource::Favorites => Row::registered(),
    Resource::Appointments
    | Resource::MealPlans
    | Resource::Measurements => Row::patients_and_staff(),
    Resource::Patients | Resource::Users | Resource::Settings => Row::staff(),
  }
}

/// Matrix lookup for an already-parsed resource.
pub fn allows(category: UserCategory, resource: Resource) -> bool {
  row(resource).get(category)
}

// ─── Decisions ───────────────────────────────────────────────────────────────

/// Re-derive the category of `identity` from its stored attributes.
pub fn category_of(identity: &Identity) -> UserCategory {
  if identity.is_guest() {
    return UserCategory::Guest;
  }
  UserCategory::for_registered(
    identity.is_administrator,
    identity.role_label.as_deref(),
    identity.linked_patient_id,
  )
}

/// Whether `identity` may access the resource called `resource_name`.
pub fn is_allowed(identity: &Identity, resource_name: &str) -> Result<bool, UnknownResource> {
  let resource = Resource::parse(resource_name)?;
  Ok(allows(category_of(identity), resource))
}

/// Like [`is_allowed`], but a denial becomes
/// [`AuthError::PermissionDenied`] carrying a required-role hint.
pub fn authorize(identity: &Identity, resource_name: &str) -> Result<Resource, AuthError> {
  let resource = Resource::parse(resource_name)?;
  let category = category_of(identity);
  if allows(category, resource) {
    return Ok(resource);
  }
  Err(AuthError::PermissionDenied {
    category,
    resource,
    required: required_roles_hint(resource),
  })
}

/// Categories allowed to access `resource`, least privileged first.
pub fn required_roles(resource: Resource) -> Vec<UserCategory> {
  UserCategory::ALL
    .into_iter()
    .filter(|c| allows(*c, resource))
    .collect()
}

/// Every resource `category` may access.
pub fn allowed_resources(category: UserCategory) -> Vec<Resource> {
  Resource::ALL
    .into_iter()
    .filter(|r| allows(category, *r))
    .collect()
}

fn required_roles_hint(resource: Resource) -> String {
  let labels: Vec<&str> = required_roles(resource)
    .into_iter()
    .map(UserCategory::label)
    .collect();
  match labels.split_last() {
    None => "no role".to_owned(),
    Some((last, [])) => (*last).to_owned(),
    Some((last, rest)) => format!("{} o {last}", rest.join(", ")),
  }
}
