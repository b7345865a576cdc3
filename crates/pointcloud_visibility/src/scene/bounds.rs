//! Axis-aligned bounding box with double precision for huge clouds.

use glam::{DAffine3, DVec3};

/// Three-way classification of a box against a volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Containment {
	/// Entirely outside the volume.
	Outside,
	/// Entirely inside the volume.
	Inside,
	/// Straddles the volume boundary (also used for ties).
	Intersects,
}

impl Containment {
	/// Swap `Inside` and `Outside`.
	#[inline]
	pub fn inverted(self) -> Self {
		match self {
			Containment::Outside => Containment::Inside,
			Containment::Inside => Containment::Outside,
			Containment::Intersects => Containment::Intersects,
		}
	}
}

/// Double-precision axis-aligned bounding box.
///
/// Node extents are expressed in the owning cloud's local frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DAabb3 {
	/// Minimum corner (inclusive).
	pub min: DVec3,
	/// Maximum corner (inclusive).
	pub max: DVec3,
}

impl DAabb3 {
	/// Create a new AABB from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: DVec3, max: DVec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"AABB min must be <= max on all axes"
		);
		Self { min, max }
	}

	/// Create a new AABB from center and half-extents.
	pub fn from_center_half_extents(center: DVec3, half_extents: DVec3) -> Self {
		Self {
			min: center - half_extents,
			max: center + half_extents,
		}
	}

	/// Check if this AABB overlaps with another.
	///
	/// Two AABBs overlap if they share any interior or boundary points.
	#[inline]
	pub fn overlaps(&self, other: &DAabb3) -> bool {
		self.min.x <= other.max.x
			&& self.max.x >= other.min.x
			&& self.min.y <= other.max.y
			&& self.max.y >= other.min.y
			&& self.min.z <= other.max.z
			&& self.max.z >= other.min.z
	}

	/// Check if this AABB contains a point.
	#[inline]
	pub fn contains_point(&self, point: DVec3) -> bool {
		point.cmpge(self.min).all() && point.cmple(self.max).all()
	}

	/// Check if this AABB fully contains another.
	#[inline]
	pub fn contains(&self, other: &DAabb3) -> bool {
		self.contains_point(other.min) && self.contains_point(other.max)
	}

	/// Classify `other` against this box as a volume.
	///
	/// Touching boxes intersect.
	pub fn classify(&self, other: &DAabb3) -> Containment {
		if !self.overlaps(other) {
			Containment::Outside
		} else if self.contains(other) {
			Containment::Inside
		} else {
			Containment::Intersects
		}
	}

	/// Get the size of the AABB (max - min).
	#[inline]
	pub fn size(&self) -> DVec3 {
		self.max - self.min
	}

	/// Get the center of the AABB.
	#[inline]
	pub fn center(&self) -> DVec3 {
		(self.min + self.max) * 0.5
	}

	/// The 8 corners. Bit 0 of the index selects +X, bit 1 +Y, bit 2 +Z.
	pub fn corners(&self) -> [DVec3; 8] {
		std::array::from_fn(|i| {
			DVec3::new(
				if i & 1 == 0 { self.min.x } else { self.max.x },
				if i & 2 == 0 { self.min.y } else { self.max.y },
				if i & 4 == 0 { self.min.z } else { self.max.z },
			)
		})
	}

	/// Child box for an octant, same bit layout as [`Self::corners`].
	pub fn octant(&self, octant: u8) -> Self {
		let center = self.center();
		let pick = |bit: u8, lo: f64, mid: f64, hi: f64| {
			if octant & bit == 0 {
				(lo, mid)
			} else {
				(mid, hi)
			}
		};
		let (x0, x1) = pick(1, self.min.x, center.x, self.max.x);
		let (y0, y1) = pick(2, self.min.y, center.y, self.max.y);
		let (z0, z1) = pick(4, self.min.z, center.z, self.max.z);
		Self {
			min: DVec3::new(x0, y0, z0),
			max: DVec3::new(x1, y1, z1),
		}
	}

	/// Conservative AABB of this box after an affine transform.
	pub fn transformed(&self, transform: &DAffine3) -> Self {
		let corners = self.corners().map(|c| transform.transform_point3(c));
		let (min, max) = corners[1..]
			.iter()
			.fold((corners[0], corners[0]), |(min, max), &p| (min.min(p), max.max(p)));
		Self { min, max }
	}
}
