//! Contact records and the consumer callback
//!
//! Detectors write their contacts into a stack-resident [`ContactBuffer`] and
//! hand the filled slice to a [`CollisionFunctor`] exactly once per pair.

use super::primitives::PrimitiveKind;
use super::skin::CollDetectInfo;
use crate::foundation::math::Vec3;

/// Maximum contact points reported for one primitive pair
pub const MAX_CONTACTS: usize = 10;

/// One contact between two bodies
///
/// Offsets are relative to each body's start-of-step position, also for
/// contacts found on a later pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// Contact position relative to body A
    pub r0: Vec3,
    /// Contact position relative to body B
    pub r1: Vec3,
    /// Penetration depth; positive when overlapping, negative inside the tolerance band
    pub initial_penetration: f32,
}

impl Default for ContactPoint {
    fn default() -> Self {
        Self {
            r0: Vec3::zeros(),
            r1: Vec3::zeros(),
            initial_penetration: 0.0,
        }
    }
}

impl ContactPoint {
    /// Create a contact from offsets and depth
    pub fn new(r0: Vec3, r1: Vec3, initial_penetration: f32) -> Self {
        Self {
            r0,
            r1,
            initial_penetration,
        }
    }

    /// Contact at world position `point` for bodies located at `body0` and `body1`
    pub fn at(point: Vec3, body0: Vec3, body1: Vec3, initial_penetration: f32) -> Self {
        Self::new(point - body0, point - body1, initial_penetration)
    }
}

/// Fixed-capacity contact list; pushes past capacity are counted, not stored
#[derive(Debug, Clone)]
pub struct ContactBuffer {
    points: [ContactPoint; MAX_CONTACTS],
    len: usize,
    dropped: usize,
}

impl Default for ContactBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactBuffer {
    /// Empty buffer
    pub fn new() -> Self {
        Self {
            points: [ContactPoint::default(); MAX_CONTACTS],
            len: 0,
            dropped: 0,
        }
    }

    /// Append a contact; returns false when the buffer is full
    pub fn push(&mut self, point: ContactPoint) -> bool {
        if self.len == MAX_CONTACTS {
            self.dropped += 1;
            return false;
        }
        self.points[self.len] = point;
        self.len += 1;
        true
    }

    /// Forget all contacts
    pub fn clear(&mut self) {
        self.len = 0;
        self.dropped = 0;
    }

    /// Stored contacts
    pub fn as_slice(&self) -> &[ContactPoint] {
        &self.points[..self.len]
    }

    /// Number of stored contacts
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if at least one push was rejected
    pub fn is_truncated(&self) -> bool {
        self.dropped > 0
    }

    /// Number of rejected pushes
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Receives the contacts of one primitive pair
pub trait CollisionFunctor {
    /// Called once per pair with at least one contact; `dir_to_body0` is the
    /// unit contact normal pointing toward body A
    fn collision_notify(&mut self, info: &CollDetectInfo<'_>, dir_to_body0: Vec3, points: &[ContactPoint]);
}

impl<F> CollisionFunctor for F
where
    F: FnMut(&CollDetectInfo<'_>, Vec3, &[ContactPoint]),
{
    fn collision_notify(&mut self, info: &CollDetectInfo<'_>, dir_to_body0: Vec3, points: &[ContactPoint]) {
        self(info, dir_to_body0, points)
    }
}

/// One notification as stored by [`ContactCollector`]
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionReport {
    /// Primitive index within skin A
    pub prim0: usize,
    /// Primitive index within skin B
    pub prim1: usize,
    /// Kind of primitive A
    pub kind0: PrimitiveKind,
    /// Kind of primitive B
    pub kind1: PrimitiveKind,
    /// Unit normal toward body A
    pub normal: Vec3,
    /// Contacts of this pair
    pub points: Vec<ContactPoint>,
}

impl CollisionReport {
    /// Deepest penetration among the contacts
    pub fn max_depth(&self) -> f32 {
        self.points
            .iter()
            .map(|p| p.initial_penetration)
            .fold(f32::NEG_INFINITY, f32::max)
    }
}

/// Functor that keeps every notification it receives
#[derive(Debug, Default, Clone)]
pub struct ContactCollector {
    reports: Vec<CollisionReport>,
}

impl ContactCollector {
    /// Empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far, in arrival order
    pub fn reports(&self) -> &[CollisionReport] {
        &self.reports
    }

    /// Total contacts across all notifications
    pub fn contact_count(&self) -> usize {
        self.reports.iter().map(|r| r.points.len()).sum()
    }

    /// Drop stored notifications, keeping the allocation
    pub fn clear(&mut self) {
        self.reports.clear();
    }
}

impl CollisionFunctor for ContactCollector {
    fn collision_notify(&mut self, info: &CollDetectInfo<'_>, dir_to_body0: Vec3, points: &[ContactPoint]) {
        self.reports.push(CollisionReport {
            prim0: info.prim0(),
            prim1: info.prim1(),
            kind0: info.kind0(),
            kind1: info.kind1(),
            normal: dir_to_body0,
            points: points.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::primitives::Sphere;
    use crate::physics::collision::skin::CollisionSkin;

    #[test]
    fn test_buffer_truncates_and_counts() {
        let mut buffer = ContactBuffer::new();
        for i in 0..MAX_CONTACTS + 3 {
            let accepted = buffer.push(ContactPoint::new(Vec3::zeros(), Vec3::zeros(), i as f32));
            assert_eq!(accepted, i < MAX_CONTACTS);
        }
        assert_eq!(buffer.len(), MAX_CONTACTS);
        assert!(buffer.is_truncated());
        assert_eq!(buffer.dropped(), 3);
        assert_eq!(buffer.as_slice()[4].initial_penetration, 4.0);

        buffer.clear();
        assert!(buffer.is_empty());
        assert!(!buffer.is_truncated());
    }

    #[test]
    fn test_contact_offsets() {
        let c = ContactPoint::at(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 0.0, 0.0), Vec3::zeros(), 0.5);
        assert_eq!(c.r0, Vec3::new(0.0, 2.0, 3.0));
        assert_eq!(c.r1, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_closure_and_collector_receive_notifications() {
        let mut a = CollisionSkin::new();
        a.add_primitive(Sphere::new(Vec3::zeros(), 1.0));
        let mut b = CollisionSkin::new();
        b.add_primitive(Sphere::new(Vec3::zeros(), 1.0));
        let info = CollDetectInfo::new(&a, 0, &b, 0);
        let points = [ContactPoint::new(Vec3::x(), -Vec3::x(), 0.25)];

        let mut calls = 0;
        let mut closure = |_: &CollDetectInfo<'_>, normal: Vec3, pts: &[ContactPoint]| {
            calls += 1;
            assert_eq!(normal, Vec3::y());
            assert_eq!(pts.len(), 1);
        };
        closure.collision_notify(&info, Vec3::y(), &points);
        assert_eq!(calls, 1);

        let mut collector = ContactCollector::new();
        collector.collision_notify(&info, Vec3::y(), &points);
        assert_eq!(collector.reports().len(), 1);
        assert_eq!(collector.contact_count(), 1);
        assert_eq!(collector.reports()[0].kind0, PrimitiveKind::Sphere);
        assert_eq!(collector.reports()[0].max_depth(), 0.25);
    }
}
