use mesh_props::ids::lids::ItemLidsProperty;
use mesh_props::ids::{NULL_LOCAL_ID, UniqueId};
use mesh_props::mesh_error::MeshPropsError;

#[test]
fn allocation_recycling_session() {
    let mut lid_prop = ItemLidsProperty::new("test_property");
    assert_eq!(lid_prop.name(), "test_property");
    assert_eq!(lid_prop.values().len(), 0);

    // first append: fresh dense lids
    let uids: Vec<UniqueId> = vec![1, 2, 3, 4, 5];
    let mut nb_item = uids.len();
    let added = lid_prop.append(&uids);
    assert_eq!(lid_prop.len(), uids.len());
    assert_eq!(lid_prop.lids(&uids), added.local_ids());
    let lids_range = lid_prop.values();
    assert_eq!(lids_range.len(), uids.len());
    assert_eq!(lids_range.local_ids(), added.local_ids());

    // append with duplicates: mapped uids keep their lids
    let uids: Vec<UniqueId> = vec![6, 7, 7, 8, 1, 5, 9];
    let one_lid = lid_prop.lids(&[1]);
    let five_lid = lid_prop.lids(&[5]);
    let nb_duplicates = 3;
    nb_item += uids.len() - nb_duplicates;
    let added = lid_prop.append(&uids);
    assert_eq!(lid_prop.lids(&uids), added.local_ids());
    assert_eq!(lid_prop.lids(&[1]), one_lid);
    assert_eq!(lid_prop.lids(&[5]), five_lid);
    assert_eq!(lid_prop.len(), nb_item);

    // removal releases lids and keeps values() consistent
    let removed_uids: Vec<UniqueId> = vec![1, 3, 5, 9];
    let removed_lids_ref = lid_prop.lids(&removed_uids);
    let removed_lids = lid_prop.remove(&removed_uids).unwrap();
    nb_item -= removed_uids.len();
    assert_eq!(removed_lids, removed_lids_ref);
    assert_eq!(lid_prop.values().len(), lid_prop.len());
    assert_eq!(lid_prop.values().len(), nb_item);
    let remaining_uids: Vec<UniqueId> = vec![2, 4, 6, 7, 8];
    assert_eq!(lid_prop.values().local_ids(), lid_prop.lids(&remaining_uids));

    // re-adding the removed uids drains the free list, no nulls
    let added = lid_prop.append(&removed_uids);
    nb_item += removed_lids.len();
    assert_eq!(added.len(), removed_uids.len());
    assert!(!added.local_ids().contains(&NULL_LOCAL_ID));
    assert_eq!(added.local_ids(), lid_prop.lids(&removed_uids));

    // brand-new uids grow past the recycled block
    let new_uids: Vec<UniqueId> = vec![10, 11, 12];
    let added = lid_prop.append(&new_uids);
    nb_item += added.len();
    assert_eq!(added.len(), 3);
    assert!(!added.local_ids().contains(&NULL_LOCAL_ID));
    assert_eq!(added.local_ids(), lid_prop.lids(&new_uids));
    assert_eq!(lid_prop.values().len(), lid_prop.len());
    assert_eq!(lid_prop.values().len(), nb_item);

    // live lids match the never-removed uids, up to reordering
    let all_uids: Vec<UniqueId> = (1..=12).collect();
    let mut lids_ref = lid_prop.lids(&all_uids);
    let mut lids = lid_prop.values().local_ids();
    lids_ref.sort_unstable();
    lids.sort_unstable();
    assert_eq!(lids, lids_ref);
}

#[test]
fn growth_stays_strictly_necessary() {
    let mut lid_prop = ItemLidsProperty::new("test_property");
    lid_prop.append(&[0, 1, 2]);
    lid_prop.remove(&[1]).unwrap();
    assert_eq!(lid_prop.len(), 2);
    // the released lid is the next one handed out
    let range = lid_prop.append(&[9]);
    assert_eq!(range.local_ids(), vec![1]);
    // no lid beyond the three ever allocated exists
    assert_eq!(lid_prop.values().max_local_id(), Some(2));
}

#[test]
fn unmapped_uids() {
    let mut lid_prop = ItemLidsProperty::new("test_property");
    lid_prop.append(&[5, 6]);
    // lookup: null sentinel
    assert_eq!(lid_prop.lids(&[42]), vec![NULL_LOCAL_ID]);
    // removal: hard error
    assert_eq!(
        lid_prop.remove(&[42]),
        Err(MeshPropsError::UnknownUniqueId(42))
    );
}
