//! Molecule aggregate: identity, lifecycle, and fingerprints by type.
//!
//! A [`Molecule`] owns at most one [`Fingerprint`] per [`FingerprintType`].
//! Storing a new fingerprint of a type supersedes the old one. Only
//! [`MoleculeStatus::Active`] molecules take part in similarity search.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chemsim_core::{Annotated, ChemsimError, Result, Summarizable};
use chrono::{DateTime, Utc};

use crate::fingerprint::{Fingerprint, FingerprintType};

/// Lifecycle state of a molecule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoleculeStatus {
    /// Registered, not yet searchable.
    #[default]
    Pending,
    Active,
    Archived,
    /// Soft-deleted; no further changes are accepted.
    Deleted,
}

impl fmt::Display for MoleculeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MoleculeStatus::Pending => "pending",
            MoleculeStatus::Active => "active",
            MoleculeStatus::Archived => "archived",
            MoleculeStatus::Deleted => "deleted",
        })
    }
}

/// A registered molecule and its fingerprints.
#[derive(Debug, Clone)]
pub struct Molecule {
    id: String,
    smiles: String,
    name: Option<String>,
    status: MoleculeStatus,
    tags: BTreeSet<String>,
    metadata: BTreeMap<String, String>,
    fingerprints: BTreeMap<FingerprintType, Fingerprint>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Molecule {
    /// Register a molecule by canonical identifier (e.g. InChIKey) and SMILES.
    ///
    /// # Errors
    ///
    /// Returns [`ChemsimError::InvalidInput`] if either string is blank.
    pub fn new(id: impl Into<String>, smiles: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let smiles = smiles.into();
        if id.trim().is_empty() {
            return Err(ChemsimError::InvalidInput("molecule id is empty".into()));
        }
        if smiles.trim().is_empty() {
            return Err(ChemsimError::InvalidInput("molecule SMILES is empty".into()));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            smiles,
            name: None,
            status: MoleculeStatus::Pending,
            tags: BTreeSet::new(),
            metadata: BTreeMap::new(),
            fingerprints: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Attach a common name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn smiles(&self) -> &str {
        &self.smiles
    }

    pub fn status(&self) -> MoleculeStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether the molecule takes part in similarity search.
    pub fn is_searchable(&self) -> bool {
        self.status == MoleculeStatus::Active
    }

    /// `Pending` or `Archived` → `Active`.
    pub fn activate(&mut self) -> Result<()> {
        match self.status {
            MoleculeStatus::Pending | MoleculeStatus::Archived => {
                self.transition(MoleculeStatus::Active)
            }
            MoleculeStatus::Active => Ok(()),
            MoleculeStatus::Deleted => Err(self.refuse("activate")),
        }
    }

    /// `Active` → `Archived`.
    pub fn archive(&mut self) -> Result<()> {
        match self.status {
            MoleculeStatus::Active => self.transition(MoleculeStatus::Archived),
            MoleculeStatus::Archived => Ok(()),
            MoleculeStatus::Pending | MoleculeStatus::Deleted => Err(self.refuse("archive")),
        }
    }

    /// Any live state → `Deleted`.
    pub fn delete(&mut self) -> Result<()> {
        if self.status == MoleculeStatus::Deleted {
            return Err(self.refuse("delete"));
        }
        self.transition(MoleculeStatus::Deleted)
    }

    /// Add a tag; returns `false` if it was already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> Result<bool> {
        self.ensure_live("tag")?;
        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(ChemsimError::InvalidInput("tag is empty".into()));
        }
        let added = self.tags.insert(tag);
        if added {
            self.touch();
        }
        Ok(added)
    }

    /// Remove a tag; returns whether it was present.
    pub fn remove_tag(&mut self, tag: &str) -> Result<bool> {
        self.ensure_live("untag")?;
        let removed = self.tags.remove(tag);
        if removed {
            self.touch();
        }
        Ok(removed)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Set a metadata entry, returning the previous value.
    pub fn set_metadata(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>> {
        self.ensure_live("annotate")?;
        let previous = self.metadata.insert(key.into(), value.into());
        self.touch();
        Ok(previous)
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Store `fingerprint`, superseding any fingerprint of the same type.
    ///
    /// Returns the superseded fingerprint.
    pub fn set_fingerprint(&mut self, fingerprint: Fingerprint) -> Result<Option<Fingerprint>> {
        self.ensure_live("fingerprint")?;
        let previous = self
            .fingerprints
            .insert(fingerprint.fingerprint_type(), fingerprint);
        self.touch();
        Ok(previous)
    }

    /// Drop the fingerprint of `fp_type`, returning it.
    pub fn remove_fingerprint(&mut self, fp_type: FingerprintType) -> Result<Option<Fingerprint>> {
        self.ensure_live("fingerprint")?;
        let removed = self.fingerprints.remove(&fp_type);
        if removed.is_some() {
            self.touch();
        }
        Ok(removed)
    }

    /// The fingerprint of `fp_type`, if one has been computed.
    pub fn fingerprint(&self, fp_type: FingerprintType) -> Option<&Fingerprint> {
        self.fingerprints.get(&fp_type)
    }

    /// All fingerprints, ordered by type.
    pub fn fingerprints(&self) -> impl Iterator<Item = &Fingerprint> {
        self.fingerprints.values()
    }

    /// Types this molecule holds a fingerprint for.
    pub fn fingerprint_types(&self) -> impl Iterator<Item = FingerprintType> + '_ {
        self.fingerprints.keys().copied()
    }

    fn transition(&mut self, to: MoleculeStatus) -> Result<()> {
        self.status = to;
        self.touch();
        Ok(())
    }

    fn ensure_live(&self, action: &'static str) -> Result<()> {
        if self.status == MoleculeStatus::Deleted {
            return Err(self.refuse(action));
        }
        Ok(())
    }

    fn refuse(&self, action: &'static str) -> ChemsimError {
        ChemsimError::InvalidStateTransition {
            from: self.status.to_string(),
            action,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Annotated for Molecule {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    fn description(&self) -> Option<&str> {
        self.metadata("description")
    }
}

impl Summarizable for Molecule {
    fn summary(&self) -> String {
        let types: Vec<&str> = self.fingerprints.keys().map(|t| t.as_str()).collect();
        format!(
            "Molecule {} ({}): {}, fingerprints [{}]",
            self.id,
            self.smiles,
            self.status,
            types.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemsim_core::ErrorKind;

    fn aspirin() -> Molecule {
        Molecule::new("BSYNRYMUTXBXSQ-UHFFFAOYSA-N", "CC(=O)Oc1ccccc1C(=O)O")
            .unwrap()
            .with_name("aspirin")
    }

    fn morgan(payload: &[u8]) -> Fingerprint {
        Fingerprint::bit_vector(FingerprintType::Morgan, payload, payload.len() * 8, 2).unwrap()
    }

    #[test]
    fn blank_identity_rejected() {
        assert!(Molecule::new("", "CCO").is_err());
        assert!(Molecule::new("LFQSCWFLJHTTHZ-UHFFFAOYSA-N", "  ").is_err());
    }

    #[test]
    fn lifecycle() {
        let mut mol = aspirin();
        assert_eq!(mol.status(), MoleculeStatus::Pending);
        assert!(!mol.is_searchable());

        let err = mol.archive().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        mol.activate().unwrap();
        assert!(mol.is_searchable());
        mol.archive().unwrap();
        assert_eq!(mol.status(), MoleculeStatus::Archived);
        mol.activate().unwrap();
        mol.delete().unwrap();
        assert_eq!(mol.status(), MoleculeStatus::Deleted);

        assert!(mol.activate().is_err());
        assert!(mol.delete().is_err());
        assert!(mol.add_tag("nsaid").is_err());
        assert!(mol.set_fingerprint(morgan(&[1])).is_err());
    }

    #[test]
    fn newer_fingerprint_supersedes() {
        let mut mol = aspirin();
        assert!(mol.set_fingerprint(morgan(&[0x01, 0x02])).unwrap().is_none());
        let old = mol.set_fingerprint(morgan(&[0xFF, 0x00])).unwrap().unwrap();
        assert_eq!(old.bytes(), Some([0x01, 0x02].as_slice()));
        assert_eq!(
            mol.fingerprint(FingerprintType::Morgan).unwrap().bytes(),
            Some([0xFF, 0x00].as_slice())
        );
        assert_eq!(mol.fingerprints().count(), 1);

        let maccs = Fingerprint::bit_vector(FingerprintType::Maccs, &[0u8; 21], 166, 0).unwrap();
        mol.set_fingerprint(maccs).unwrap();
        let types: Vec<_> = mol.fingerprint_types().collect();
        assert_eq!(types, vec![FingerprintType::Maccs, FingerprintType::Morgan]);

        assert!(mol.remove_fingerprint(FingerprintType::Maccs).unwrap().is_some());
        assert!(mol.fingerprint(FingerprintType::Maccs).is_none());
    }

    #[test]
    fn tags_and_metadata() {
        let mut mol = aspirin();
        assert!(mol.add_tag("nsaid").unwrap());
        assert!(!mol.add_tag("nsaid").unwrap());
        assert!(mol.has_tag("nsaid"));
        assert!(mol.add_tag("").is_err());
        assert!(mol.remove_tag("nsaid").unwrap());
        assert_eq!(mol.tags().count(), 0);

        assert_eq!(mol.set_metadata("source", "chembl").unwrap(), None);
        assert_eq!(
            mol.set_metadata("source", "pubchem").unwrap(),
            Some("chembl".to_string())
        );
        assert_eq!(mol.metadata("source"), Some("pubchem"));
    }

    #[test]
    fn annotations() {
        let mut mol = aspirin();
        assert_eq!(mol.name(), "aspirin");
        mol.set_metadata("description", "acetylsalicylic acid").unwrap();
        assert_eq!(mol.description(), Some("acetylsalicylic acid"));
        let unnamed = Molecule::new("XLYOFNOQVPJJNP-UHFFFAOYSA-N", "O").unwrap();
        assert_eq!(unnamed.name(), "XLYOFNOQVPJJNP-UHFFFAOYSA-N");
        assert_eq!(
            unnamed.summary(),
            "Molecule XLYOFNOQVPJJNP-UHFFFAOYSA-N (O): pending, fingerprints []"
        );
    }
}
