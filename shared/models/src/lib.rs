//! # PartPal Core Domain Models
//! 
//! Domain types shared by the BOM parser, the distributor backends and the
//! price optimizer.
//! 
//! ## Key Models
//! 
//! - **Component**: one BOM line with the six canonical fields, all string-valued
//! - **Field**: the canonical field names (fields of interest)
//! - **Bom**: the ordered list of components, with the grand-total computation
//! - **ProductRecord**: the canonical shape of a successful distributor lookup
//! 
//! ## Numeric coercion
//! 
//! Costs and quantities stay strings until they are needed. [`parse_amount`] is
//! the one place that decides whether a cell is a usable number; comparison and
//! totals both rely on it.

pub mod component;
pub mod bom;
pub mod product;


pub use component::*;
pub use bom::*;
pub use product::*;
